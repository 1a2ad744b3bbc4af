//! # Hardlinker FS
//!
//! Filesystem half of the Hardlinker mirror: deciding whether a source file
//! may be mirrored, and mirroring it into the destination tree with a
//! hardlink.
//!
//! ## Pipeline
//!
//! Every candidate path, whether it came from a remote event or from a full
//! tree walk, goes through the same two stages:
//!
//! 1. [`QualificationFilter`] - existence, not a directory, inside the source
//!    root, not excluded
//! 2. [`Materializer`] - create missing parent directories, then hardlink
//!
//! [`LinkPipeline`] chains the two and turns every outcome into a log line.
//! [`reconcile`] feeds a whole source tree through the pipeline.
//!
//! ## Key Invariants
//!
//! - An existing destination path is never overwritten or re-linked
//! - "Already exists" while linking is success, not failure
//! - Rejections and per-file OS failures never abort the caller
//!
//! ## Example
//!
//! ```rust,no_run
//! use hardlinker_fs::{ExclusionPattern, LinkPipeline};
//! use std::path::Path;
//!
//! let pipeline = LinkPipeline::new(
//!     "/files/source",
//!     "/files/destination",
//!     ExclusionPattern::new(r"\.tmp$").unwrap(),
//! );
//! let outcome = pipeline.process(Path::new("/files/source/a/b.txt"));
//! println!("{outcome:?}");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod error;
mod filter;
mod materializer;
mod pipeline;
mod scanner;

pub use error::{LinkError, LinkResult};
pub use filter::{qualify, ExclusionPattern, Qualification, QualificationFilter, Rejection};
pub use materializer::{LinkOutcome, Materializer};
pub use pipeline::{LinkPipeline, LinkTally, ProcessOutcome};
pub use scanner::{reconcile, ScanReport};
