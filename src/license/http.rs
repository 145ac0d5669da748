//! Minimal HTTP access for license documents.

use std::sync::OnceLock;
use std::time::Duration;

/// Network timeout for a single license document download.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors arising from HTTP downloads.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    Request {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested document was not found (HTTP 404).
    #[error("document not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },
}

/// Fetches documents over HTTP.
///
/// Abstractions allow tests to serve canned documents without network
/// access.
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient {
    /// Downloads `url` and returns the body as text.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::NotFound`] on 404 and [`HttpError::Request`] on
    /// any other failure.
    fn get_text(&self, url: &str) -> Result<String, HttpError>;
}

/// HTTP client using a shared `ureq` agent.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqClient;

impl HttpClient for UreqClient {
    fn get_text(&self, url: &str) -> Result<String, HttpError> {
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        response
            .into_body()
            .read_to_string()
            .map_err(|e| HttpError::Request {
                url: url.to_owned(),
                reason: e.to_string(),
            })
    }
}

/// Shared `ureq` agent with request timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(DOWNLOAD_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to an [`HttpError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> HttpError {
    match err {
        ureq::Error::StatusCode(404) => HttpError::NotFound {
            url: url.to_owned(),
        },
        other => HttpError::Request {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
