//! In-memory task store used by unit tests.

use crate::api::TaskStore;
use crate::error::SyncError;
use crate::models::{Task, TaskDraft, TaskId, TaskStatus};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, hour, minute, 0).unwrap()
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    tasks: Mutex<Vec<Task>>,
    scripted: Mutex<VecDeque<(Duration, Vec<Task>)>>,
    next_id: AtomicU64,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    fail_lists: AtomicBool,
    fail_creates: AtomicBool,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn task(&self, title: &str, deadline: DateTime<Utc>, status: TaskStatus) -> Task {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Task {
            id: TaskId::new(id.to_string()),
            title: title.to_string(),
            description: String::new(),
            deadline,
            status,
        }
    }

    pub(crate) fn insert(&self, title: &str, deadline: DateTime<Utc>, status: TaskStatus) -> TaskId {
        let task = self.task(title, deadline, status);
        let id = task.id.clone();
        self.tasks.lock().push(task);
        id
    }

    /// Queues a canned list response delivered after `delay`.
    pub(crate) fn script_list(&self, delay: Duration, tasks: Vec<Task>) {
        self.scripted.lock().push_back((delay, tasks));
    }

    pub(crate) fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn set_status(&self, id: &TaskId, status: TaskStatus) -> Result<(), SyncError> {
        let mut tasks = self.tasks.lock();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == *id)
            .ok_or_else(|| SyncError::NotFound(id.clone()))?;
        task.status = status;
        Ok(())
    }
}

impl TaskStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Task>, SyncError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(SyncError::Server {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        let scripted = self.scripted.lock().pop_front();
        match scripted {
            Some((delay, tasks)) => {
                tokio::time::sleep(delay).await;
                Ok(tasks)
            }
            None => Ok(self.tasks.lock().clone()),
        }
    }

    async fn create(&self, draft: &TaskDraft) -> Result<(), SyncError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(SyncError::Server {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        let mut task = self.task(&draft.title, draft.deadline, TaskStatus::Ongoing);
        task.description = draft.description.clone();
        self.tasks.lock().push(task);
        Ok(())
    }

    async fn complete(&self, id: &TaskId) -> Result<(), SyncError> {
        self.set_status(id, TaskStatus::Success)
    }

    async fn delete(&self, id: &TaskId) -> Result<(), SyncError> {
        let mut tasks = self.tasks.lock();
        let before = tasks.len();
        tasks.retain(|t| t.id != *id);
        if tasks.len() == before {
            return Err(SyncError::NotFound(id.clone()));
        }
        Ok(())
    }
}
