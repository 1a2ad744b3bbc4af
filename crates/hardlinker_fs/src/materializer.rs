//! Hardlink materialization.
//!
//! The destination path is the source path re-rooted from the source root to
//! the destination root. Materialization never replaces anything: the
//! existence of the destination is the only record that a file was mirrored.

use crate::error::{LinkError, LinkResult};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::info;

/// What happened when materializing a qualified source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// A new hardlink was created.
    Linked,
    /// The destination already existed before linking was attempted.
    AlreadyPresent,
    /// The destination appeared between the existence check and the link
    /// call, e.g. because another process linked it first.
    LostRace,
}

/// Creates hardlinks for source files below one root into a destination root.
#[derive(Debug, Clone)]
pub struct Materializer {
    source_root: PathBuf,
    destination_root: PathBuf,
}

impl Materializer {
    /// Creates a new materializer.
    pub fn new(source_root: impl Into<PathBuf>, destination_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            destination_root: destination_root.into(),
        }
    }

    /// Returns the source root.
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Returns the destination root.
    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    /// Computes the destination path that mirrors `source`.
    ///
    /// The prefix is stripped lexically first. The lexical remainder is only
    /// used if it consists of plain names; otherwise (a `..` in the path, or
    /// the source and root spelled differently) both sides are canonicalized
    /// and the strip is retried on the resolved paths.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::OutsideRoot`] if `source` is not strictly below the
    /// source root.
    pub fn destination_for(&self, source: &Path) -> LinkResult<PathBuf> {
        let relative = match source.strip_prefix(&self.source_root) {
            Ok(relative) if is_plain(relative) => relative.to_path_buf(),
            _ => self.canonical_relative(source)?,
        };

        if relative.as_os_str().is_empty() {
            return Err(self.outside(source));
        }

        Ok(self.destination_root.join(relative))
    }

    fn canonical_relative(&self, source: &Path) -> LinkResult<PathBuf> {
        let (Ok(source_canon), Ok(root_canon)) = (
            fs::canonicalize(source),
            fs::canonicalize(&self.source_root),
        ) else {
            return Err(self.outside(source));
        };

        match source_canon.strip_prefix(&root_canon) {
            Ok(relative) if is_plain(relative) => Ok(relative.to_path_buf()),
            _ => Err(self.outside(source)),
        }
    }

    fn outside(&self, source: &Path) -> LinkError {
        LinkError::OutsideRoot {
            path: source.to_path_buf(),
            root: self.source_root.clone(),
        }
    }

    /// Mirrors `source` into the destination tree with a hardlink.
    ///
    /// Steps:
    /// 1. Compute the destination path
    /// 2. Create its parent directories if missing
    /// 3. Return [`LinkOutcome::AlreadyPresent`] if the destination exists
    /// 4. Hardlink; "already exists" here yields [`LinkOutcome::LostRace`]
    ///
    /// Calling this twice for the same file leaves the same end state as
    /// calling it once.
    ///
    /// # Errors
    ///
    /// Returns an error for any OS failure other than "already exists"
    /// (cross-device link, permission denied, disk full, ...).
    pub fn materialize(&self, source: &Path) -> LinkResult<LinkOutcome> {
        let destination = self.destination_for(source)?;

        if let Some(parent) = destination.parent() {
            ensure_dir(parent, &destination)?;
        }

        // symlink_metadata so that a dangling symlink also counts as present
        if fs::symlink_metadata(&destination).is_ok() {
            return Ok(LinkOutcome::AlreadyPresent);
        }

        classify_link(fs::hard_link(source, &destination), source, destination)
    }
}

/// Returns true if `relative` only walks down through named entries.
fn is_plain(relative: &Path) -> bool {
    relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
}

/// Turns the result of the link call into an outcome.
///
/// "Already exists" means someone else created the destination after the
/// existence check.
fn classify_link(
    result: io::Result<()>,
    source: &Path,
    destination: PathBuf,
) -> LinkResult<LinkOutcome> {
    match result {
        Ok(()) => {
            info!(source = ?source, destination = ?destination, "Linked file");
            Ok(LinkOutcome::Linked)
        }
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            info!(destination = ?destination, "Destination appeared while linking");
            Ok(LinkOutcome::LostRace)
        }
        Err(err) => Err(LinkError::Link {
            from: source.to_path_buf(),
            to: destination,
            err,
        }),
    }
}

fn ensure_dir(dir: &Path, for_destination: &Path) -> LinkResult<()> {
    if dir.is_dir() {
        return Ok(());
    }

    fs::create_dir_all(dir).map_err(|err| LinkError::CreateDir {
        path: dir.to_path_buf(),
        err,
    })?;

    info!(
        directory = ?dir,
        destination = ?for_destination,
        "Created parent directory"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        source: PathBuf,
        destination: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        let destination = dir.path().join("destination");
        fs::create_dir_all(source.join("a")).unwrap();
        fs::write(source.join("a/b.txt"), b"payload").unwrap();
        Fixture {
            _dir: dir,
            source,
            destination,
        }
    }

    #[cfg(unix)]
    fn same_inode(a: &Path, b: &Path) -> bool {
        use std::os::unix::fs::MetadataExt;
        let a = fs::metadata(a).unwrap();
        let b = fs::metadata(b).unwrap();
        a.ino() == b.ino() && a.dev() == b.dev()
    }

    #[test]
    fn destination_mapping() {
        let m = Materializer::new("/files/source", "/files/destination");
        assert_eq!(
            m.destination_for(Path::new("/files/source/a/b.txt")).unwrap(),
            PathBuf::from("/files/destination/a/b.txt")
        );
    }

    #[test]
    fn destination_mapping_with_trailing_slash_root() {
        let m = Materializer::new("/files/source/", "/files/destination/");
        assert_eq!(
            m.destination_for(Path::new("/files/source/a/b.txt")).unwrap(),
            PathBuf::from("/files/destination/a/b.txt")
        );
    }

    #[test]
    fn root_itself_has_no_destination() {
        let m = Materializer::new("/files/source", "/files/destination");
        assert!(matches!(
            m.destination_for(Path::new("/files/source")),
            Err(LinkError::OutsideRoot { .. })
        ));
        assert!(matches!(
            m.destination_for(Path::new("/elsewhere/x")),
            Err(LinkError::OutsideRoot { .. })
        ));
    }

    #[test]
    fn parent_components_are_resolved_before_mapping() {
        let f = fixture();
        fs::create_dir_all(f.source.join("x")).unwrap();
        let deep = f.destination.join("deep");
        let m = Materializer::new(&f.source, &deep);

        // Lexically below the root, resolves back into it.
        let dotted = f.source.join("x/../../source/a/b.txt");
        assert_eq!(m.destination_for(&dotted).unwrap(), deep.join("a/b.txt"));

        assert_eq!(m.materialize(&dotted).unwrap(), LinkOutcome::Linked);
        assert!(deep.join("a/b.txt").is_file());
        assert!(!f.destination.join("source").exists());
    }

    #[test]
    fn parent_components_escaping_the_root_are_rejected() {
        let f = fixture();
        fs::write(f.source.parent().unwrap().join("outside.txt"), b"x").unwrap();
        let m = Materializer::new(&f.source, &f.destination);

        let escaping = f.source.join("a/../../outside.txt");
        assert!(matches!(
            m.destination_for(&escaping),
            Err(LinkError::OutsideRoot { .. })
        ));
        assert!(matches!(
            m.destination_for(&f.source.join("a/../../missing/x.txt")),
            Err(LinkError::OutsideRoot { .. })
        ));
        assert!(!f.destination.exists());
    }

    #[test]
    fn already_exists_while_linking_is_a_lost_race() {
        let raced = io::Error::from(io::ErrorKind::AlreadyExists);
        let outcome =
            classify_link(Err(raced), Path::new("/s/a.txt"), PathBuf::from("/d/a.txt")).unwrap();
        assert_eq!(outcome, LinkOutcome::LostRace);

        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        let err = classify_link(Err(denied), Path::new("/s/a.txt"), PathBuf::from("/d/a.txt"))
            .unwrap_err();
        assert!(matches!(err, LinkError::Link { .. }));
    }

    #[test]
    fn linking_onto_a_created_destination_is_a_lost_race() {
        let f = fixture();
        let source = f.source.join("a/b.txt");
        let destination = f.destination.join("b.txt");
        fs::create_dir_all(&f.destination).unwrap();
        fs::write(&destination, b"first").unwrap();

        // Skip the existence check, as if the destination appeared after it.
        let outcome = classify_link(
            fs::hard_link(&source, &destination),
            &source,
            destination.clone(),
        )
        .unwrap();

        assert_eq!(outcome, LinkOutcome::LostRace);
        assert_eq!(fs::read(&destination).unwrap(), b"first");
    }

    #[test]
    fn links_and_creates_parents() {
        let f = fixture();
        let m = Materializer::new(&f.source, &f.destination);

        let outcome = m.materialize(&f.source.join("a/b.txt")).unwrap();
        assert_eq!(outcome, LinkOutcome::Linked);

        let linked = f.destination.join("a/b.txt");
        assert!(f.destination.join("a").is_dir());
        assert_eq!(fs::read(&linked).unwrap(), b"payload");
        #[cfg(unix)]
        assert!(same_inode(&linked, &f.source.join("a/b.txt")));
    }

    #[test]
    fn second_call_is_a_no_op() {
        let f = fixture();
        let m = Materializer::new(&f.source, &f.destination);
        let source = f.source.join("a/b.txt");

        assert_eq!(m.materialize(&source).unwrap(), LinkOutcome::Linked);
        assert_eq!(m.materialize(&source).unwrap(), LinkOutcome::AlreadyPresent);
        assert_eq!(fs::read(f.destination.join("a/b.txt")).unwrap(), b"payload");
    }

    #[test]
    fn existing_destination_is_left_alone() {
        let f = fixture();
        fs::create_dir_all(f.destination.join("a")).unwrap();
        fs::write(f.destination.join("a/b.txt"), b"keep me").unwrap();

        let m = Materializer::new(&f.source, &f.destination);
        let outcome = m.materialize(&f.source.join("a/b.txt")).unwrap();

        assert_eq!(outcome, LinkOutcome::AlreadyPresent);
        assert_eq!(fs::read(f.destination.join("a/b.txt")).unwrap(), b"keep me");
    }

    #[test]
    fn missing_source_is_a_link_error() {
        let f = fixture();
        let m = Materializer::new(&f.source, &f.destination);

        let err = m.materialize(&f.source.join("a/gone.txt")).unwrap_err();
        assert!(matches!(err, LinkError::Link { .. }));
        assert_eq!(
            err.io_error().map(io::Error::kind),
            Some(io::ErrorKind::NotFound)
        );
    }

    #[test]
    fn parent_blocked_by_file_is_a_dir_error() {
        let f = fixture();
        fs::create_dir_all(&f.destination).unwrap();
        fs::write(f.destination.join("a"), b"not a dir").unwrap();

        let m = Materializer::new(&f.source, &f.destination);
        let err = m.materialize(&f.source.join("a/b.txt")).unwrap_err();
        assert!(matches!(err, LinkError::CreateDir { .. }));
    }
}
