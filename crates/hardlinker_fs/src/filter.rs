//! Path qualification.
//!
//! A candidate path qualifies for linking when, checked in this order:
//!
//! 1. it is non-empty and exists right now
//! 2. it is not a directory
//! 3. it lives strictly below the source root (after canonicalization)
//! 4. its string form does not match the exclusion pattern
//!
//! The first failing check decides the [`Rejection`]. Files disappear between
//! event emission and processing all the time, so none of this is an error.

use crate::error::LinkResult;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Why a candidate path was not linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// The path is empty or does not exist.
    Missing,
    /// The path is a directory.
    Directory,
    /// The path is the source root itself or lies outside of it.
    OutsideSourceRoot,
    /// The path matches the exclusion pattern.
    Excluded,
}

impl Rejection {
    /// Short machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::Missing => "missing",
            Rejection::Directory => "directory",
            Rejection::OutsideSourceRoot => "outside_source_root",
            Rejection::Excluded => "excluded",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rejection::Missing => "it does not exist",
            Rejection::Directory => "it is a directory",
            Rejection::OutsideSourceRoot => "it is not inside the source root",
            Rejection::Excluded => "it matches the exclusion pattern",
        };
        f.write_str(text)
    }
}

/// Result of qualifying one candidate path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualification {
    /// The path may be linked.
    Qualified,
    /// The path must be skipped.
    Rejected(Rejection),
}

impl Qualification {
    /// Returns true if the path may be linked.
    pub fn is_qualified(&self) -> bool {
        matches!(self, Qualification::Qualified)
    }

    /// Returns the rejection reason, if any.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Qualification::Qualified => None,
            Qualification::Rejected(reason) => Some(*reason),
        }
    }
}

/// A compiled exclusion regex.
///
/// The match is an unanchored search over the whole path string. An empty
/// pattern excludes nothing.
#[derive(Debug, Clone, Default)]
pub struct ExclusionPattern {
    regex: Option<Regex>,
}

impl ExclusionPattern {
    /// Compiles an exclusion pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn new(pattern: &str) -> LinkResult<Self> {
        if pattern.is_empty() {
            return Ok(Self::none());
        }
        Ok(Self {
            regex: Some(Regex::new(pattern)?),
        })
    }

    /// A pattern that excludes nothing.
    pub fn none() -> Self {
        Self { regex: None }
    }

    /// Returns the source text of the pattern (empty if none).
    pub fn as_str(&self) -> &str {
        self.regex.as_ref().map_or("", Regex::as_str)
    }

    /// Returns true if `path` is excluded.
    pub fn is_excluded(&self, path: &Path) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(&path.to_string_lossy()),
            None => false,
        }
    }
}

/// Qualification rules bound to one source root and exclusion pattern.
#[derive(Debug, Clone)]
pub struct QualificationFilter {
    source_root: PathBuf,
    exclusions: ExclusionPattern,
}

impl QualificationFilter {
    /// Creates a filter for the given source root.
    pub fn new(source_root: impl Into<PathBuf>, exclusions: ExclusionPattern) -> Self {
        Self {
            source_root: source_root.into(),
            exclusions,
        }
    }

    /// Returns the configured source root.
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Returns the exclusion pattern.
    pub fn exclusions(&self) -> &ExclusionPattern {
        &self.exclusions
    }

    /// Qualifies a single candidate path.
    pub fn evaluate(&self, path: &Path) -> Qualification {
        qualify(path, &self.source_root, &self.exclusions)
    }
}

/// Qualifies `path` against `source_root` and `exclusions`.
///
/// The filesystem is consulted at call time, so the answer for the same path
/// may change between calls.
pub fn qualify(path: &Path, source_root: &Path, exclusions: &ExclusionPattern) -> Qualification {
    if path.as_os_str().is_empty() {
        return Qualification::Rejected(Rejection::Missing);
    }

    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(_) => return Qualification::Rejected(Rejection::Missing),
    };

    if metadata.is_dir() {
        return Qualification::Rejected(Rejection::Directory);
    }

    if !is_strictly_inside(path, source_root) {
        return Qualification::Rejected(Rejection::OutsideSourceRoot);
    }

    if exclusions.is_excluded(path) {
        return Qualification::Rejected(Rejection::Excluded);
    }

    Qualification::Qualified
}

/// Canonicalizes both sides and checks that `path` lies below `root`.
///
/// A root that cannot be canonicalized (e.g. it was never created) contains
/// nothing.
fn is_strictly_inside(path: &Path, root: &Path) -> bool {
    let (Ok(path), Ok(root)) = (fs::canonicalize(path), fs::canonicalize(root)) else {
        return false;
    };
    path != root && path.starts_with(&root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        fs::create_dir_all(source.join("a")).unwrap();
        fs::write(source.join("a/b.txt"), b"hello").unwrap();
        fs::write(source.join("a/c.tmp"), b"partial").unwrap();
        fs::write(dir.path().join("outside.txt"), b"nope").unwrap();
        (dir, source)
    }

    #[test]
    fn qualified_file() {
        let (_dir, source) = tree();
        let filter = QualificationFilter::new(&source, ExclusionPattern::none());
        assert_eq!(filter.evaluate(&source.join("a/b.txt")), Qualification::Qualified);
    }

    #[test]
    fn missing_and_empty_paths() {
        let (_dir, source) = tree();
        let filter = QualificationFilter::new(&source, ExclusionPattern::none());
        assert_eq!(
            filter.evaluate(&source.join("a/gone.txt")).rejection(),
            Some(Rejection::Missing)
        );
        assert_eq!(
            filter.evaluate(Path::new("")).rejection(),
            Some(Rejection::Missing)
        );
    }

    #[test]
    fn directory_rejected_before_containment() {
        let (dir, source) = tree();
        let filter = QualificationFilter::new(&source, ExclusionPattern::none());
        assert_eq!(
            filter.evaluate(&source.join("a")).rejection(),
            Some(Rejection::Directory)
        );
        // The temp dir is outside the root, but the directory check comes first.
        assert_eq!(
            filter.evaluate(dir.path()).rejection(),
            Some(Rejection::Directory)
        );
    }

    #[test]
    fn outside_root_rejected() {
        let (dir, source) = tree();
        let filter = QualificationFilter::new(&source, ExclusionPattern::none());
        assert_eq!(
            filter.evaluate(&dir.path().join("outside.txt")).rejection(),
            Some(Rejection::OutsideSourceRoot)
        );
        // Dot-dot escapes are resolved before the containment check.
        assert_eq!(
            filter
                .evaluate(&source.join("a/../../outside.txt"))
                .rejection(),
            Some(Rejection::OutsideSourceRoot)
        );
    }

    #[test]
    fn sibling_with_common_prefix_is_outside() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        let sibling = dir.path().join("source-old");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&sibling).unwrap();
        fs::write(sibling.join("x.txt"), b"x").unwrap();

        let filter = QualificationFilter::new(&source, ExclusionPattern::none());
        assert_eq!(
            filter.evaluate(&sibling.join("x.txt")).rejection(),
            Some(Rejection::OutsideSourceRoot)
        );
    }

    #[test]
    fn missing_root_contains_nothing() {
        let (dir, source) = tree();
        let filter = QualificationFilter::new(dir.path().join("nope"), ExclusionPattern::none());
        assert_eq!(
            filter.evaluate(&source.join("a/b.txt")).rejection(),
            Some(Rejection::OutsideSourceRoot)
        );
    }

    #[test]
    fn exclusion_pattern() {
        let (_dir, source) = tree();
        let filter = QualificationFilter::new(&source, ExclusionPattern::new(r"\.tmp$").unwrap());
        assert_eq!(
            filter.evaluate(&source.join("a/c.tmp")).rejection(),
            Some(Rejection::Excluded)
        );
        assert!(filter.evaluate(&source.join("a/b.txt")).is_qualified());
    }

    #[test]
    fn exclusion_is_unanchored() {
        let pattern = ExclusionPattern::new("/a/").unwrap();
        assert!(pattern.is_excluded(Path::new("/files/source/a/b.txt")));
        assert!(!pattern.is_excluded(Path::new("/files/source/b/a.txt")));
    }

    #[test]
    fn empty_pattern_excludes_nothing() {
        let pattern = ExclusionPattern::new("").unwrap();
        assert_eq!(pattern.as_str(), "");
        assert!(!pattern.is_excluded(Path::new("/anything.tmp")));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(ExclusionPattern::new("(unclosed").is_err());
    }

    #[test]
    fn rejection_codes_are_distinct() {
        let codes = [
            Rejection::Missing.code(),
            Rejection::Directory.code(),
            Rejection::OutsideSourceRoot.code(),
            Rejection::Excluded.code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
