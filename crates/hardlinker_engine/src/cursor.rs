//! Storage seam for the event cursor.
//!
//! The consumer loads the cursor once when it is built and saves it after
//! every drained batch. Only an in-memory store ships; a durable store would
//! implement [`CursorStore`] with its own atomic-write discipline.

use crate::error::EngineResult;
use std::sync::atomic::{AtomicU64, Ordering};

/// Where the consumer keeps its `last_seen_id` between batches.
pub trait CursorStore: Send + Sync {
    /// Loads the cursor to resume from.
    fn load(&self) -> EngineResult<u64>;

    /// Saves the cursor after a batch was drained.
    fn save(&self, cursor: u64) -> EngineResult<()>;
}

/// A process-local cursor store. The cursor is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    cursor: AtomicU64,
}

impl MemoryCursorStore {
    /// Creates a store that resumes from `cursor`.
    pub fn new(cursor: u64) -> Self {
        Self {
            cursor: AtomicU64::new(cursor),
        }
    }
}

impl CursorStore for MemoryCursorStore {
    fn load(&self) -> EngineResult<u64> {
        Ok(self.cursor.load(Ordering::SeqCst))
    }

    fn save(&self, cursor: u64) -> EngineResult<()> {
        self.cursor.store(cursor, Ordering::SeqCst);
        Ok(())
    }
}
