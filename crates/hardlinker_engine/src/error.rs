//! Error types for the engine.

use hardlinker_api::{ApiError, SystemError};
use hardlinker_fs::LinkError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in the engine.
///
/// The consumer loop itself never fails; these surface from setup steps such
/// as the health check or a cursor store.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Remote API failure.
    #[error("remote API error: {0}")]
    Api(#[from] ApiError),

    /// Filesystem failure.
    #[error("link error: {0}")]
    Link(#[from] LinkError),

    /// The remote reported system errors during the health check.
    #[error("remote reported {} error(s)", .0.len())]
    RemoteErrors(Vec<SystemError>),

    /// The cursor store failed.
    #[error("cursor store error: {0}")]
    CursorStore(String),
}
