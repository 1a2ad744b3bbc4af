//! Error types for remote API calls.

use thiserror::Error;

/// Result type for remote API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur when talking to the remote API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network failure (connection refused, reset, DNS, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The request ran into its deadline.
    ///
    /// For event polls this is the normal end of an idle long-poll.
    #[error("request timed out")]
    Timeout,

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The server answered with an `error` payload.
    #[error("API error: {0}")]
    Api(String),

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The client could not be configured.
    #[error("client configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Returns true if repeating the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) | ApiError::Timeout | ApiError::Api(_) => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true for the expected end of an idle long-poll.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout)
    }

    /// Returns true if the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}
