//! Catalog command implementation.

use super::build_extractor;
use crate::cli::CatalogArgs;
use crate::config::Config;
use crate::error::Result;
use crate::loader::load_document;
use crate::output::Formatter;

/// Execute the catalog command.
pub async fn execute_catalog(args: CatalogArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let document = load_document(&args.file)?;

    let mut extractor_config = config.extractor.clone();
    if let Some(level) = args.level {
        extractor_config.requirement_level = level;
    }
    let extractor = build_extractor(config, extractor_config, args.model)?;

    let entries = extractor.extract_catalog(&document).await?;

    println!("{}", formatter.format_catalog(&entries)?);
    Ok(())
}
