//! HTTP clients for the pipeline's external collaborators: the vision
//! extraction service, the nutrition database, and the translation
//! service.
//!
//! Each client implements the corresponding `mealscan-core` port, so
//! the pipeline never sees `reqwest` types. Transport and decode
//! failures map to [`CoreError::ProviderUnavailable`]; the matching
//! cascade decides what unavailability means per source.
//!
//! [`CoreError::ProviderUnavailable`]: mealscan_core::error::CoreError

use mealscan_core::error::CoreError;

pub mod nutrition;
pub mod translate;
pub mod vision;

pub use nutrition::HttpNutritionProvider;
pub use translate::HttpTranslator;
pub use vision::HttpVisionExtractor;

/// Build the shared HTTP client with a per-request timeout.
fn build_client(timeout: std::time::Duration) -> Result<reqwest::Client, CoreError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CoreError::Internal(format!("http client init: {e}")))
}

/// Map a transport-level failure onto the unavailability error.
fn transport_err(service: &str, e: reqwest::Error) -> CoreError {
    CoreError::ProviderUnavailable(format!("{service}: {e}"))
}

/// Reject non-2xx responses before decoding.
async fn require_success(
    service: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, CoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(service, %status, body = %body.chars().take(200).collect::<String>(), "upstream error");
    Err(CoreError::ProviderUnavailable(format!(
        "{service}: upstream returned {status}"
    )))
}
