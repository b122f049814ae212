//! Client-side view of the remote task store.
//!
//! [`SyncClient`] owns the current task snapshot. Every successful fetch
//! replaces the snapshot wholesale, unless a fetch issued later has already
//! been applied. Mutations go straight to the store and then ask the poll
//! scheduler for an immediate refresh.

use crate::api::TaskStore;
use crate::classify::{classify, Buckets};
use crate::error::SyncError;
use crate::models::{Task, TaskDraft, TaskId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// In-flight indicator for one class of operations.
#[derive(Debug, Default)]
pub struct BusyFlag {
    in_flight: AtomicUsize,
}

impl BusyFlag {
    pub fn acquire(&self) -> BusyGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        BusyGuard { flag: self }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }
}

/// Clears its share of the flag when dropped, on every exit path.
#[derive(Debug)]
pub struct BusyGuard<'a> {
    flag: &'a BusyFlag,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The last applied task list and the sequence number of the fetch that produced it.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub seq: u64,
}

impl Snapshot {
    pub fn is_loaded(&self) -> bool {
        self.seq > 0
    }
}

struct Shared {
    snapshot: Mutex<Snapshot>,
    next_seq: AtomicU64,
    grid: BusyFlag,
    form: BusyFlag,
    refresh: Notify,
}

pub struct SyncClient<S> {
    store: Arc<S>,
    shared: Arc<Shared>,
}

impl<S> Clone for SyncClient<S> {
    fn clone(&self) -> Self {
        SyncClient {
            store: Arc::clone(&self.store),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: TaskStore> SyncClient<S> {
    pub fn new(store: S) -> Self {
        SyncClient {
            store: Arc::new(store),
            shared: Arc::new(Shared {
                snapshot: Mutex::new(Snapshot::default()),
                next_seq: AtomicU64::new(0),
                grid: BusyFlag::default(),
                form: BusyFlag::default(),
                refresh: Notify::new(),
            }),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetches the full task list and applies it if no newer fetch has landed.
    ///
    /// Returns whether the response replaced the snapshot.
    pub async fn refresh(&self) -> Result<bool, SyncError> {
        let seq = self.shared.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let _busy = self.shared.grid.acquire();

        let tasks = self.store.list().await?;
        Ok(self.apply(seq, tasks))
    }

    fn apply(&self, seq: u64, tasks: Vec<Task>) -> bool {
        let mut snapshot = self.shared.snapshot.lock();
        if seq <= snapshot.seq {
            tracing::debug!(seq, applied = snapshot.seq, "dropping stale task list");
            return false;
        }
        tracing::debug!(seq, count = tasks.len(), "task list replaced");
        *snapshot = Snapshot { tasks, seq };
        true
    }

    pub async fn create(&self, mut draft: TaskDraft) -> Result<(), SyncError> {
        let _busy = self.shared.form.acquire();

        draft.title = draft.title.trim().to_string();
        if draft.title.is_empty() {
            return Err(SyncError::Validation("task title cannot be empty".to_string()));
        }

        self.store.create(&draft).await?;
        tracing::info!(title = %draft.title, deadline = %draft.deadline, "task created");
        self.request_refresh();
        Ok(())
    }

    pub async fn complete(&self, id: &TaskId) -> Result<(), SyncError> {
        let _busy = self.shared.grid.acquire();

        self.store.complete(id).await?;
        tracing::info!(task_id = %id, "task completed");
        self.request_refresh();
        Ok(())
    }

    pub async fn delete(&self, id: &TaskId) -> Result<(), SyncError> {
        let _busy = self.shared.grid.acquire();

        self.store.delete(id).await?;
        tracing::info!(task_id = %id, "task deleted");
        self.request_refresh();
        Ok(())
    }
}

impl<S> SyncClient<S> {
    pub fn snapshot(&self) -> Snapshot {
        self.shared.snapshot.lock().clone()
    }

    pub fn buckets(&self) -> Buckets {
        classify(self.shared.snapshot.lock().tasks.iter().cloned())
    }

    /// True while a fetch, completion or deletion is in flight.
    pub fn is_grid_busy(&self) -> bool {
        self.shared.grid.is_busy()
    }

    /// True while a create is in flight.
    pub fn is_form_busy(&self) -> bool {
        self.shared.form.is_busy()
    }

    /// Asks the poll scheduler for an out-of-band fetch.
    pub fn request_refresh(&self) {
        self.shared.refresh.notify_one();
    }

    pub(crate) async fn refresh_requested(&self) {
        self.shared.refresh.notified().await;
    }
}
