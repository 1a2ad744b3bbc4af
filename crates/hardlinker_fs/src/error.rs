//! Error types for link operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for link operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Errors that can occur while materializing or reconciling files.
///
/// Qualification rejections are not errors; see [`crate::Rejection`].
#[derive(Debug, Error)]
pub enum LinkError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The parent directory of a destination could not be created.
    #[error("failed to create directory {path:?}: {err}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        err: io::Error,
    },

    /// The hardlink itself could not be created.
    #[error("failed to link {from:?} to {to:?}: {err}")]
    Link {
        /// Existing source file.
        from: PathBuf,
        /// Destination path of the new link.
        to: PathBuf,
        /// Underlying OS error.
        #[source]
        err: io::Error,
    },

    /// The path does not live below the source root.
    #[error("{path:?} is not inside source root {root:?}")]
    OutsideRoot {
        /// Offending path.
        path: PathBuf,
        /// Configured source root.
        root: PathBuf,
    },

    /// The exclusion pattern is not a valid regular expression.
    #[error("invalid exclusion pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The source root to reconcile does not exist.
    #[error("source root {0:?} does not exist")]
    SourceRootMissing(PathBuf),
}

impl LinkError {
    /// Returns the underlying OS error, if any.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            LinkError::Io(err) | LinkError::CreateDir { err, .. } | LinkError::Link { err, .. } => {
                Some(err)
            }
            _ => None,
        }
    }
}
