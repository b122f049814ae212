//! Periodic refresh of the task snapshot.

use crate::api::TaskStore;
use crate::sync::SyncClient;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

pub struct PollScheduler;

impl PollScheduler {
    /// Fetches once immediately, then on every `interval` tick and whenever a
    /// refresh is requested, until the returned handle is stopped or dropped.
    pub fn start<S: TaskStore>(client: SyncClient<S>, interval: Duration) -> PollHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let notifier = client.clone();
        let join = tokio::spawn(poll_loop(client, interval, shutdown_rx));
        tracing::info!(interval_secs = interval.as_secs(), "poll scheduler started");

        PollHandle {
            shutdown: Some(shutdown_tx),
            join: Some(join),
            request: Box::new(move || notifier.request_refresh()),
        }
    }
}

async fn poll_loop<S: TaskStore>(
    client: SyncClient<S>,
    interval: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
            _ = client.refresh_requested() => {}
        }

        // Shutdown cancels an in-flight fetch; its busy guard drops with it.
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            result = client.refresh() => {
                if let Err(err) = result {
                    tracing::warn!(error = %err, "error fetching tasks");
                }
            }
        }
    }

    tracing::info!("poll scheduler stopped");
}

/// Owned handle to a running scheduler.
pub struct PollHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<()>>,
    request: Box<dyn Fn() + Send + Sync>,
}

impl PollHandle {
    /// Triggers a fetch now instead of waiting for the next tick.
    pub fn refresh_now(&self) {
        (self.request)();
    }

    /// Stops the loop and waits for it to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            if let Err(err) = join.await {
                tracing::warn!(error = %err, "poll task ended abnormally");
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}
