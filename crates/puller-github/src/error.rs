use thiserror::Error;

/// Error taxonomy surfaced to pipeline callers. Every non-success response
/// maps to exactly one variant; the upstream message is preserved inside.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid repository reference: {0}")]
    InvalidReference(String),
    #[error("authentication failed (401): {0}")]
    AuthenticationFailed(String),
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("access forbidden (403): {0}")]
    Forbidden(String),
    #[error("not found (404): {0}")]
    NotFound(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<puller_core::CoreError> for ApiError {
    fn from(err: puller_core::CoreError) -> Self {
        ApiError::InvalidReference(err.to_string())
    }
}
