//! # Hardlinker Engine
//!
//! Consumes the remote event log and turns each completed item into a
//! hardlink in the destination tree.
//!
//! This crate provides:
//! - [`EventConsumer`], the long-poll state machine (polling → processing →
//!   polling, with backoff on failure)
//! - Event-to-path resolution through folder and file metadata
//! - A [`CursorStore`] seam for the last consumed event id
//! - [`check_connection`], the startup health check
//!
//! ## Key Invariants
//!
//! - The cursor never moves backwards
//! - The cursor advances past a batch only after every event in it was handled
//! - A failed poll is retried with the same cursor
//! - A bad event or file never stops the loop
//! - Cancellation interrupts a blocked poll, never a batch in progress

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod consumer;
mod cursor;
mod error;
mod health;
mod resolve;

pub use config::{ConsumerConfig, RetryConfig, DEFAULT_EVENT_FILTER};
pub use consumer::{ConsumerState, ConsumerStats, EventConsumer, EventOutcome, PollOutcome};
pub use cursor::{CursorStore, MemoryCursorStore};
pub use error::{EngineError, EngineResult};
pub use health::check_connection;
pub use resolve::resolve_source_path;
