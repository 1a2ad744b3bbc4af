//! The remote API abstraction consumed by the engine.

use crate::error::ApiResult;
use crate::event::Event;
use crate::types::{FileInfo, FolderConfig, SystemError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Parameters of one long-poll against the event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventsRequest {
    /// Id of the last event already seen; 0 means "from the start".
    pub since: u64,
    /// Event types to subscribe to. Empty means the remote's default set.
    pub filters: Vec<String>,
    /// Maximum number of events to return.
    pub limit: Option<u32>,
    /// How long the remote may hold the request open.
    pub timeout: Duration,
}

impl EventsRequest {
    /// Creates a request starting after `since`.
    pub fn new(since: u64) -> Self {
        Self {
            since,
            filters: Vec::new(),
            limit: None,
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the event type filters.
    pub fn with_filters(mut self, filters: Vec<String>) -> Self {
        self.filters = filters;
        self
    }

    /// Sets the batch limit.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the long-poll timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Remote API used by the engine.
///
/// This trait abstracts the REST transport, allowing for different
/// implementations (HTTP, scripted mock for testing).
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Long-polls the event log for events after `request.since`.
    ///
    /// An idle poll ends either with an empty batch or with
    /// [`crate::ApiError::Timeout`]; callers treat both the same way.
    async fn poll_events(&self, request: &EventsRequest) -> ApiResult<Vec<Event>>;

    /// Looks up a folder by id.
    async fn folder(&self, folder_id: &str) -> ApiResult<FolderConfig>;

    /// Looks up an item inside a folder.
    async fn file(&self, folder_id: &str, item: &str) -> ApiResult<FileInfo>;

    /// Checks that the remote is reachable and accepts our credentials.
    async fn ping(&self) -> ApiResult<()>;

    /// Lists system errors currently reported by the remote.
    async fn list_errors(&self) -> ApiResult<Vec<SystemError>>;

    /// Clears the remote's system error list.
    async fn clear_errors(&self) -> ApiResult<()>;
}

#[async_trait]
impl<T: RemoteApi + ?Sized> RemoteApi for Arc<T> {
    async fn poll_events(&self, request: &EventsRequest) -> ApiResult<Vec<Event>> {
        (**self).poll_events(request).await
    }

    async fn folder(&self, folder_id: &str) -> ApiResult<FolderConfig> {
        (**self).folder(folder_id).await
    }

    async fn file(&self, folder_id: &str, item: &str) -> ApiResult<FileInfo> {
        (**self).file(folder_id, item).await
    }

    async fn ping(&self) -> ApiResult<()> {
        (**self).ping().await
    }

    async fn list_errors(&self) -> ApiResult<Vec<SystemError>> {
        (**self).list_errors().await
    }

    async fn clear_errors(&self) -> ApiResult<()> {
        (**self).clear_errors().await
    }
}
