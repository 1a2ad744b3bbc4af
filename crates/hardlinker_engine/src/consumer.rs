//! Event cursor consumer state machine.
//!
//! ```text
//! Polling ──batch──▶ Processing ──▶ Polling
//!    │ ──empty/timeout──────────────▶ Polling
//!    │ ──error──▶ Backoff ──────────▶ Polling
//!    └ ──cancel──▶ Stopped
//! ```
//!
//! The cursor moves to the id of the last event of a batch once the whole
//! batch was processed, whatever happened to individual events. A failed poll
//! leaves it untouched, so the retry asks for exactly the same events.

use crate::config::ConsumerConfig;
use crate::cursor::{CursorStore, MemoryCursorStore};
use crate::error::EngineResult;
use crate::resolve::resolve_source_path;
use hardlinker_api::{ApiError, Event, EventsRequest, RemoteApi};
use hardlinker_fs::{LinkPipeline, LinkTally, ProcessOutcome};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The current state of the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    /// Built but not yet running.
    Idle,
    /// Waiting on a long-poll.
    Polling,
    /// Working through a received batch.
    Processing,
    /// Waiting after a failed poll.
    Backoff,
    /// Cancelled. Terminal.
    Stopped,
}

impl ConsumerState {
    /// Returns true once the consumer can no longer make progress.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConsumerState::Stopped)
    }
}

/// What a single poll round produced.
#[derive(Debug)]
pub enum PollOutcome {
    /// A batch was received and fully processed.
    Batch {
        /// Number of events in the batch.
        events: usize,
        /// Cursor after the batch.
        cursor: u64,
    },
    /// The long-poll ended without events.
    Idle,
    /// The poll failed; the cursor was not moved.
    Failed(ApiError),
    /// Cancellation arrived while the poll was in flight.
    Cancelled,
}

/// What happened to one event of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The payload carried an error or no `(folder, item)`.
    Skipped,
    /// Folder or file metadata could not be looked up.
    Unresolved,
    /// The resolved path went through the link pipeline.
    Processed(ProcessOutcome),
}

/// Statistics about the consumer.
#[derive(Debug, Clone, Default)]
pub struct ConsumerStats {
    /// Poll requests issued.
    pub polls: u64,
    /// Non-empty batches processed.
    pub batches: u64,
    /// Events received.
    pub events_received: u64,
    /// Events without a usable `(folder, item)`.
    pub events_skipped: u64,
    /// Events whose metadata could not be resolved.
    pub events_unresolved: u64,
    /// Link pipeline outcomes.
    pub tally: LinkTally,
    /// Polls that ended without events.
    pub idle_polls: u64,
    /// Polls that failed.
    pub failed_polls: u64,
    /// Batches that started after a gap in event ids.
    pub gaps: u64,
    /// Last poll failure.
    pub last_error: Option<String>,
    /// Time the last batch was processed.
    pub last_batch_time: Option<Instant>,
}

/// Drives the long-poll loop and feeds resolved paths into the link pipeline.
pub struct EventConsumer<A: RemoteApi> {
    config: ConsumerConfig,
    api: Arc<A>,
    pipeline: LinkPipeline,
    store: Box<dyn CursorStore>,
    cursor: AtomicU64,
    state: RwLock<ConsumerState>,
    stats: RwLock<ConsumerStats>,
}

impl<A: RemoteApi> EventConsumer<A> {
    /// Creates a consumer starting from the beginning of the remote buffer.
    pub fn new(config: ConsumerConfig, api: Arc<A>, pipeline: LinkPipeline) -> Self {
        Self {
            config,
            api,
            pipeline,
            store: Box::new(MemoryCursorStore::default()),
            cursor: AtomicU64::new(0),
            state: RwLock::new(ConsumerState::Idle),
            stats: RwLock::new(ConsumerStats::default()),
        }
    }

    /// Resumes after the given event id instead of 0.
    pub fn with_start_cursor(self, cursor: u64) -> Self {
        self.cursor.store(cursor, Ordering::SeqCst);
        self
    }

    /// Uses `store` for the cursor and resumes from the value it holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be loaded.
    pub fn with_cursor_store(mut self, store: Box<dyn CursorStore>) -> EngineResult<Self> {
        self.cursor.store(store.load()?, Ordering::SeqCst);
        self.store = store;
        Ok(self)
    }

    /// Gets the id of the last event consumed.
    pub fn cursor(&self) -> u64 {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Gets the current state.
    pub fn state(&self) -> ConsumerState {
        *self.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> ConsumerStats {
        self.stats.read().clone()
    }

    /// Gets the link pipeline.
    pub fn pipeline(&self) -> &LinkPipeline {
        &self.pipeline
    }

    fn set_state(&self, state: ConsumerState) {
        *self.state.write() = state;
    }

    fn request(&self, since: u64) -> EventsRequest {
        let mut request = EventsRequest::new(since)
            .with_filters(self.config.filters.clone())
            .with_timeout(self.config.poll_timeout);
        request.limit = self.config.batch_limit;
        request
    }

    /// Runs until `cancel` fires.
    ///
    /// Failed polls are retried forever after the configured backoff. Returns
    /// the final stats.
    pub async fn run(&self, cancel: CancellationToken) -> ConsumerStats {
        info!(
            cursor = self.cursor(),
            filters = ?self.config.filters,
            "Waiting for events"
        );

        let mut failures = 0u32;

        while !cancel.is_cancelled() {
            match self.poll_once(&cancel).await {
                PollOutcome::Batch { .. } | PollOutcome::Idle => failures = 0,
                PollOutcome::Cancelled => break,
                PollOutcome::Failed(_) => {
                    failures = failures.saturating_add(1);
                    let delay = self.config.retry.delay_for_attempt(failures);
                    if !self.backoff(delay, &cancel).await {
                        break;
                    }
                }
            }
        }

        self.set_state(ConsumerState::Stopped);
        info!(cursor = self.cursor(), "Event consumer stopped");
        self.stats()
    }

    /// Sleeps for `delay`; returns false if cancelled meanwhile.
    async fn backoff(&self, delay: Duration, cancel: &CancellationToken) -> bool {
        self.set_state(ConsumerState::Backoff);
        debug!(delay_ms = delay.as_millis() as u64, "Backing off");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    /// Performs one poll round: request, then process the batch if any.
    ///
    /// Only the remote call races against `cancel`. Once a batch has arrived
    /// it is processed to the end and the cursor advanced.
    pub async fn poll_once(&self, cancel: &CancellationToken) -> PollOutcome {
        let since = self.cursor();
        let request = self.request(since);

        self.set_state(ConsumerState::Polling);
        self.stats.write().polls += 1;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            result = self.api.poll_events(&request) => result,
        };

        match result {
            Ok(events) if events.is_empty() => {
                self.stats.write().idle_polls += 1;
                PollOutcome::Idle
            }
            Ok(events) => {
                let count = events.len();
                let cursor = self.process_batch(since, &events).await;
                PollOutcome::Batch {
                    events: count,
                    cursor,
                }
            }
            Err(err) if err.is_timeout() => {
                debug!(since, "Long-poll timed out");
                self.stats.write().idle_polls += 1;
                PollOutcome::Idle
            }
            Err(err) => {
                warn!(since, error = %err, "Polling events failed");
                {
                    let mut stats = self.stats.write();
                    stats.failed_polls += 1;
                    stats.last_error = Some(err.to_string());
                }
                PollOutcome::Failed(err)
            }
        }
    }

    /// Processes a non-empty batch in arrival order and advances the cursor.
    async fn process_batch(&self, since: u64, events: &[Event]) -> u64 {
        self.set_state(ConsumerState::Processing);

        let first = events.first().map_or(since, |event| event.id);
        let gap = since > 0 && first > since.saturating_add(1);
        if gap {
            debug!(since, first, "Gap in event ids, remote dropped events");
        }

        let mut batch_stats = ConsumerStats::default();
        for event in events {
            match self.handle_event(event).await {
                EventOutcome::Skipped => batch_stats.events_skipped += 1,
                EventOutcome::Unresolved => batch_stats.events_unresolved += 1,
                EventOutcome::Processed(outcome) => batch_stats.tally.record(outcome),
            }
        }

        let last = events.last().map_or(since, |event| event.id);
        let cursor = if last >= since {
            last
        } else {
            warn!(since, last, "Event ids went backwards, keeping cursor");
            since
        };

        self.cursor.store(cursor, Ordering::SeqCst);
        if let Err(err) = self.store.save(cursor) {
            warn!(cursor, error = %err, "Failed to save cursor");
        }

        let mut stats = self.stats.write();
        stats.batches += 1;
        stats.events_received += events.len() as u64;
        stats.events_skipped += batch_stats.events_skipped;
        stats.events_unresolved += batch_stats.events_unresolved;
        stats.tally.linked += batch_stats.tally.linked;
        stats.tally.already_present += batch_stats.tally.already_present;
        stats.tally.rejected += batch_stats.tally.rejected;
        stats.tally.failed += batch_stats.tally.failed;
        stats.gaps += u64::from(gap);
        stats.last_batch_time = Some(Instant::now());

        cursor
    }

    /// Resolves one event and runs it through the link pipeline.
    pub async fn handle_event(&self, event: &Event) -> EventOutcome {
        let Some(target) = event.file_target() else {
            debug!(id = event.id, kind = %event.kind, "Skipping event without file target");
            return EventOutcome::Skipped;
        };

        let Some(path) = resolve_source_path(self.api.as_ref(), &target).await else {
            return EventOutcome::Unresolved;
        };

        EventOutcome::Processed(self.pipeline.process(&path))
    }
}
