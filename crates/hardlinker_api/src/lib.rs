//! # Hardlinker API
//!
//! The remote side of Hardlinker: Syncthing's event log and metadata
//! endpoints, behind the [`RemoteApi`] trait.
//!
//! This crate provides:
//! - Wire types ([`Event`], [`FolderConfig`], [`FileInfo`], [`SystemError`])
//! - The [`RemoteApi`] trait consumed by the engine
//! - [`SyncthingClient`], a `reqwest` implementation of the REST API
//! - [`MockApi`], a scripted implementation for tests
//!
//! ## Error Taxonomy
//!
//! [`ApiError::Timeout`] is the expected end of an idle long-poll and is kept
//! apart from every other failure. [`ApiError::NotFound`] marks metadata that
//! does not exist (yet, or anymore).

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod client;
mod error;
mod event;
mod http;
mod mock;
mod types;

pub use client::{EventsRequest, RemoteApi};
pub use error::{ApiError, ApiResult};
pub use event::{Event, FileTarget};
pub use http::{ClientConfig, SyncthingClient, DEFAULT_PORT, POLL_GRACE};
pub use mock::MockApi;
pub use types::{FileInfo, FolderConfig, LocalFile, SystemError};
