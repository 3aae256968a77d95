use thiserror::Error;

/// Failure modes of a fetch.
///
/// `Http` and `Network` are retried up to the configured limit; `Parse`
/// occurs inside the same attempt boundary and is retried identically.
/// `Cancelled` is never retried and is never surfaced through the
/// `request-error` event - callers decide whether to ignore it.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Request superseded by a newer request")]
    Cancelled,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl FetchError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = if body.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string()
        } else {
            Self::truncate_body(body)
        };
        FetchError::Http {
            status: status.as_u16(),
            message,
        }
    }

    /// True for the superseded-request failure, so callers can tell it
    /// apart from a real error.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}
