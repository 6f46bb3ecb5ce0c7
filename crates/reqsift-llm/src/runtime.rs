//! Bridge from the synchronous provider trait to async HTTP calls

use crate::LlmError;
use std::future::Future;
use std::time::Duration;

/// HTTP client whose requests give up after `timeout`
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Drive `fut` to completion from synchronous code.
///
/// Inside a tokio runtime this must be called from a blocking thread
/// (`spawn_blocking`), which is how the extractor invokes providers. Outside
/// any runtime a private current-thread runtime is built for the call.
pub(crate) fn block_on<F: Future>(fut: F) -> Result<F::Output, LlmError> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Ok(handle.block_on(fut)),
        Err(_) => {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| LlmError::Config(format!("Failed to start runtime: {}", e)))?;
            Ok(rt.block_on(fut))
        }
    }
}
