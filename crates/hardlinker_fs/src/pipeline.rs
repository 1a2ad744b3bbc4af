//! Qualify-then-materialize pipeline shared by the event consumer and the
//! reconciliation scanner.

use crate::filter::{ExclusionPattern, Qualification, QualificationFilter, Rejection};
use crate::materializer::{LinkOutcome, Materializer};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Final outcome of running one candidate path through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// A new hardlink was created.
    Linked,
    /// The destination already existed (including lost races).
    AlreadyPresent,
    /// The path did not qualify.
    Rejected(Rejection),
    /// An OS error prevented linking; the file was skipped.
    Failed,
}

impl From<LinkOutcome> for ProcessOutcome {
    fn from(outcome: LinkOutcome) -> Self {
        match outcome {
            LinkOutcome::Linked => ProcessOutcome::Linked,
            LinkOutcome::AlreadyPresent | LinkOutcome::LostRace => ProcessOutcome::AlreadyPresent,
        }
    }
}

/// Running counts of pipeline outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkTally {
    /// Hardlinks created.
    pub linked: u64,
    /// Destinations that already existed.
    pub already_present: u64,
    /// Paths that did not qualify.
    pub rejected: u64,
    /// Paths skipped because of an OS error.
    pub failed: u64,
}

impl LinkTally {
    /// Counts one outcome.
    pub fn record(&mut self, outcome: ProcessOutcome) {
        match outcome {
            ProcessOutcome::Linked => self.linked += 1,
            ProcessOutcome::AlreadyPresent => self.already_present += 1,
            ProcessOutcome::Rejected(_) => self.rejected += 1,
            ProcessOutcome::Failed => self.failed += 1,
        }
    }

    /// Total number of outcomes counted.
    pub fn total(&self) -> u64 {
        self.linked + self.already_present + self.rejected + self.failed
    }
}

/// The qualification filter and materializer bound to one source/destination
/// pair.
#[derive(Debug, Clone)]
pub struct LinkPipeline {
    filter: QualificationFilter,
    materializer: Materializer,
}

impl LinkPipeline {
    /// Creates a pipeline mirroring `source_root` into `destination_root`.
    pub fn new(
        source_root: impl Into<PathBuf>,
        destination_root: impl Into<PathBuf>,
        exclusions: ExclusionPattern,
    ) -> Self {
        let source_root = source_root.into();
        Self {
            filter: QualificationFilter::new(source_root.clone(), exclusions),
            materializer: Materializer::new(source_root, destination_root),
        }
    }

    /// Returns the source root.
    pub fn source_root(&self) -> &Path {
        self.filter.source_root()
    }

    /// Returns the destination root.
    pub fn destination_root(&self) -> &Path {
        self.materializer.destination_root()
    }

    /// Returns the qualification filter.
    pub fn filter(&self) -> &QualificationFilter {
        &self.filter
    }

    /// Returns the materializer.
    pub fn materializer(&self) -> &Materializer {
        &self.materializer
    }

    /// Qualifies `path` and, if it qualifies, materializes it.
    ///
    /// Never fails: rejections are logged at info level, OS failures at error
    /// level, and the caller moves on to the next path either way.
    pub fn process(&self, path: &Path) -> ProcessOutcome {
        if let Qualification::Rejected(reason) = self.filter.evaluate(path) {
            info!(
                path = ?path,
                reason = reason.code(),
                "Ignoring {} because {}",
                path.display(),
                reason
            );
            return ProcessOutcome::Rejected(reason);
        }

        match self.materializer.materialize(path) {
            Ok(outcome) => outcome.into(),
            Err(err) => {
                error!(path = ?path, error = %err, "Failed to link file");
                ProcessOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, LinkPipeline) {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        fs::create_dir_all(source.join("a")).unwrap();
        fs::write(source.join("a/b.txt"), b"b").unwrap();
        fs::write(source.join("a/c.tmp"), b"c").unwrap();
        let pipeline = LinkPipeline::new(
            &source,
            dir.path().join("destination"),
            ExclusionPattern::new(r"\.tmp$").unwrap(),
        );
        (dir, pipeline)
    }

    #[test]
    fn process_links_then_reports_present() {
        let (_dir, pipeline) = setup();
        let path = pipeline.source_root().join("a/b.txt");

        assert_eq!(pipeline.process(&path), ProcessOutcome::Linked);
        assert_eq!(pipeline.process(&path), ProcessOutcome::AlreadyPresent);
        assert!(pipeline.destination_root().join("a/b.txt").is_file());
    }

    #[test]
    fn process_rejects_without_touching_destination() {
        let (_dir, pipeline) = setup();

        let outcome = pipeline.process(&pipeline.source_root().join("a/c.tmp"));
        assert_eq!(outcome, ProcessOutcome::Rejected(Rejection::Excluded));

        let outcome = pipeline.process(&pipeline.source_root().join("a"));
        assert_eq!(outcome, ProcessOutcome::Rejected(Rejection::Directory));

        assert!(!pipeline.destination_root().exists());
    }

    #[test]
    fn process_reports_os_failure() {
        let (_dir, pipeline) = setup();
        fs::create_dir_all(pipeline.destination_root()).unwrap();
        fs::write(pipeline.destination_root().join("a"), b"blocker").unwrap();

        let outcome = pipeline.process(&pipeline.source_root().join("a/b.txt"));
        assert_eq!(outcome, ProcessOutcome::Failed);
    }

    #[test]
    fn lost_race_counts_as_present() {
        assert_eq!(ProcessOutcome::from(LinkOutcome::LostRace), ProcessOutcome::AlreadyPresent);
        assert_eq!(
            ProcessOutcome::from(LinkOutcome::AlreadyPresent),
            ProcessOutcome::AlreadyPresent
        );
        assert_eq!(ProcessOutcome::from(LinkOutcome::Linked), ProcessOutcome::Linked);
    }

    #[test]
    fn dotted_path_stays_inside_destination() {
        let (dir, pipeline) = setup();
        let deep = dir.path().join("destination/deep");
        let pipeline = LinkPipeline::new(pipeline.source_root(), &deep, ExclusionPattern::none());
        fs::create_dir_all(pipeline.source_root().join("x")).unwrap();

        let dotted = pipeline.source_root().join("x/../../source/a/b.txt");
        assert_eq!(pipeline.process(&dotted), ProcessOutcome::Linked);

        assert!(deep.join("a/b.txt").is_file());
        assert!(!dir.path().join("destination/source").exists());
    }

    #[test]
    fn tally_counts() {
        let mut tally = LinkTally::default();
        tally.record(ProcessOutcome::Linked);
        tally.record(ProcessOutcome::Linked);
        tally.record(ProcessOutcome::AlreadyPresent);
        tally.record(ProcessOutcome::Rejected(Rejection::Missing));
        tally.record(ProcessOutcome::Failed);

        assert_eq!(tally.linked, 2);
        assert_eq!(tally.already_present, 1);
        assert_eq!(tally.rejected, 1);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.total(), 5);
    }
}
