//! Event-to-path resolution.
//!
//! An event only names a folder id and an item. The absolute source path is
//! the folder's root on disk joined with the item's local name, which takes
//! two remote lookups. Remote metadata lags event delivery, so a failed
//! lookup drops the event instead of raising.

use hardlinker_api::{ApiError, FileTarget, RemoteApi};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Resolves `target` to an absolute source path.
///
/// Returns `None` if the folder or the file cannot be looked up.
pub async fn resolve_source_path<A>(api: &A, target: &FileTarget) -> Option<PathBuf>
where
    A: RemoteApi + ?Sized,
{
    let folder = match api.folder(&target.folder).await {
        Ok(folder) => folder,
        Err(err) => {
            log_miss("folder", target, &err);
            return None;
        }
    };

    let file = match api.file(&target.folder, &target.item).await {
        Ok(file) => file,
        Err(err) => {
            log_miss("file", target, &err);
            return None;
        }
    };

    join_source(&folder.path, &file.local.name)
}

/// Joins a folder root and a folder-relative name.
fn join_source(folder_root: &str, name: &str) -> Option<PathBuf> {
    if folder_root.is_empty() || name.is_empty() {
        return None;
    }
    Some(PathBuf::from(folder_root).join(name))
}

fn log_miss(lookup: &str, target: &FileTarget, err: &ApiError) {
    if err.is_not_found() {
        debug!(
            folder = %target.folder,
            item = %target.item,
            lookup,
            "Dropping event, metadata not found"
        );
    } else {
        warn!(
            folder = %target.folder,
            item = %target.item,
            lookup,
            error = %err,
            "Dropping event, metadata lookup failed"
        );
    }
}
