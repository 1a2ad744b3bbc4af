//! Metadata records returned by the remote API.

use serde::{Deserialize, Serialize};

/// Folder configuration (`/rest/config/folders/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderConfig {
    /// Folder id.
    pub id: String,
    /// Human readable label.
    #[serde(default)]
    pub label: String,
    /// Root of the folder on the local filesystem.
    pub path: String,
}

impl FolderConfig {
    /// Creates a folder record.
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            path: path.into(),
        }
    }
}

/// File metadata (`/rest/db/file`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// The local device's view of the file.
    pub local: LocalFile,
}

/// The local side of [`FileInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFile {
    /// Path relative to the folder root.
    pub name: String,
    /// File size in bytes.
    #[serde(default)]
    pub size: i64,
    /// Whether the file is deleted locally.
    #[serde(default)]
    pub deleted: bool,
    /// Modification time as sent by the remote.
    #[serde(default)]
    pub modified: Option<String>,
}

impl FileInfo {
    /// Creates a file record with the given local name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            local: LocalFile {
                name: name.into(),
                size: 0,
                deleted: false,
                modified: None,
            },
        }
    }
}

/// A system-level error reported by the remote (`/rest/system/error`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemError {
    /// When the error occurred.
    pub when: String,
    /// Error message.
    pub message: String,
}

/// Envelope of `/rest/system/error`; `errors` is `null` when empty.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorList {
    #[serde(default)]
    pub errors: Option<Vec<SystemError>>,
}
