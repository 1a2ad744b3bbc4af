//! A scripted [`RemoteApi`] for testing.

use crate::client::{EventsRequest, RemoteApi};
use crate::error::{ApiError, ApiResult};
use crate::event::Event;
use crate::types::{FileInfo, FolderConfig, SystemError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// A mock remote API.
///
/// Poll results are served from a script in FIFO order. Once the script is
/// exhausted, polls block forever (like an idle long-poll with no timeout)
/// and [`MockApi::wait_exhausted`] resolves, so a test can cancel the
/// consumer at a known point.
#[derive(Debug, Default)]
pub struct MockApi {
    script: Mutex<VecDeque<ApiResult<Vec<Event>>>>,
    requests: Mutex<Vec<EventsRequest>>,
    folders: Mutex<HashMap<String, FolderConfig>>,
    files: Mutex<HashMap<(String, String), FileInfo>>,
    lookups: Mutex<Vec<(String, String)>>,
    errors: Mutex<Vec<SystemError>>,
    unreachable: AtomicBool,
    exhausted: Notify,
}

impl MockApi {
    /// Creates a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful poll returning `events`.
    pub fn push_batch(&self, events: Vec<Event>) {
        self.script.lock().push_back(Ok(events));
    }

    /// Queues a failed poll.
    pub fn push_error(&self, error: ApiError) {
        self.script.lock().push_back(Err(error));
    }

    /// Registers a folder.
    pub fn add_folder(&self, id: &str, path: &str) {
        self.folders
            .lock()
            .insert(id.to_string(), FolderConfig::new(id, path));
    }

    /// Registers an item of a folder with its local name.
    pub fn add_file(&self, folder: &str, item: &str, local_name: &str) {
        self.files.lock().insert(
            (folder.to_string(), item.to_string()),
            FileInfo::named(local_name),
        );
    }

    /// Adds a system error to be reported by [`RemoteApi::list_errors`].
    pub fn add_system_error(&self, when: &str, message: &str) {
        self.errors.lock().push(SystemError {
            when: when.to_string(),
            message: message.to_string(),
        });
    }

    /// Makes every non-polling call fail with a transport error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Returns all poll requests received so far.
    pub fn requests(&self) -> Vec<EventsRequest> {
        self.requests.lock().clone()
    }

    /// Returns all `(folder, item)` file lookups received so far.
    pub fn file_lookups(&self) -> Vec<(String, String)> {
        self.lookups.lock().clone()
    }

    /// Returns the number of scripted poll results not yet served.
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }

    /// Resolves once a poll found the script empty.
    pub async fn wait_exhausted(&self) {
        self.exhausted.notified().await;
    }

    fn check_reachable(&self) -> ApiResult<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(ApiError::Transport("mock remote unreachable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteApi for MockApi {
    async fn poll_events(&self, request: &EventsRequest) -> ApiResult<Vec<Event>> {
        self.requests.lock().push(request.clone());

        let next = self.script.lock().pop_front();
        match next {
            Some(result) => result,
            None => {
                self.exhausted.notify_one();
                std::future::pending().await
            }
        }
    }

    async fn folder(&self, folder_id: &str) -> ApiResult<FolderConfig> {
        self.check_reachable()?;
        self.folders
            .lock()
            .get(folder_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("folder {}", folder_id)))
    }

    async fn file(&self, folder_id: &str, item: &str) -> ApiResult<FileInfo> {
        self.check_reachable()?;
        let key = (folder_id.to_string(), item.to_string());
        self.lookups.lock().push(key.clone());
        self.files
            .lock()
            .get(&key)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("file {}/{}", folder_id, item)))
    }

    async fn ping(&self) -> ApiResult<()> {
        self.check_reachable()
    }

    async fn list_errors(&self) -> ApiResult<Vec<SystemError>> {
        self.check_reachable()?;
        Ok(self.errors.lock().clone())
    }

    async fn clear_errors(&self) -> ApiResult<()> {
        self.check_reachable()?;
        self.errors.lock().clear();
        Ok(())
    }
}
