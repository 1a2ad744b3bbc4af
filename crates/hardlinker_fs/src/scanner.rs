//! One-shot reconciliation of a whole source tree.
//!
//! Walks every entry below the source root and pushes each non-directory
//! through the [`LinkPipeline`]. Linking is idempotent, so the walk keeps no
//! state and can be interrupted and re-run at any point.

use crate::error::{LinkError, LinkResult};
use crate::pipeline::{LinkPipeline, LinkTally};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Summary of a reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Non-directory entries fed into the pipeline.
    pub visited: u64,
    /// Entries the walker could not read.
    pub walk_errors: u64,
    /// Pipeline outcomes.
    pub tally: LinkTally,
    /// Wall time of the pass.
    pub duration: Duration,
}

/// Reconciles the pipeline's source root into its destination root.
///
/// # Errors
///
/// Returns [`LinkError::SourceRootMissing`] if the source root does not exist.
/// Per-entry failures are logged and counted, never returned.
pub fn reconcile(pipeline: &LinkPipeline) -> LinkResult<ScanReport> {
    let start = Instant::now();
    let root = pipeline.source_root();

    if !root.exists() {
        return Err(LinkError::SourceRootMissing(root.to_path_buf()));
    }

    info!(source = ?root, "Searching for missing links");

    let mut report = ScanReport::default();

    for entry in WalkDir::new(root).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "Skipping unreadable entry");
                report.walk_errors += 1;
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        report.visited += 1;
        report.tally.record(pipeline.process(entry.path()));
    }

    report.duration = start.elapsed();

    info!(
        visited = report.visited,
        linked = report.tally.linked,
        already_present = report.tally.already_present,
        rejected = report.tally.rejected,
        failed = report.tally.failed,
        walk_errors = report.walk_errors,
        "Reconciliation finished"
    );

    Ok(report)
}
