//! Command implementations.

pub mod catalog;
pub mod config;
pub mod extract;
pub mod locate;
pub mod named;
pub mod rematch;
pub mod toc;

pub use self::catalog::execute_catalog;
pub use self::config::execute_config;
pub use self::extract::execute_extract;
pub use self::locate::execute_locate;
pub use self::named::execute_named;
pub use self::rematch::execute_rematch;
pub use self::toc::execute_toc;

use crate::config::Config;
use crate::error::Result;
use crate::provider::ConfiguredProvider;
use reqsift_extractor::{Extractor, ExtractorConfig};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Build an extractor for the configured provider.
///
/// Ctrl-C cancels the run between chunks; whatever was extracted so far is
/// still reported.
pub(crate) fn build_extractor(
    config: &Config,
    extractor_config: ExtractorConfig,
    model: Option<String>,
) -> Result<Extractor<ConfiguredProvider>> {
    let provider = ConfiguredProvider::from_config(config)?;
    let token = CancellationToken::new();
    let mut extractor = Extractor::new(provider, extractor_config)?.with_cancellation(token.clone());
    if let Some(model) = model {
        extractor = extractor.with_model_hint(model);
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the current chunk");
            token.cancel();
        }
    });

    Ok(extractor)
}
