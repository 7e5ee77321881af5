use super::FableValidator;
use super::bridge::{ValidationBridge, ValidationStatus};
use crate::builder::DocumentSnapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::debug;

/// Default quiet period before an edited fable is sent for validation.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Background task validating the latest snapshot of a builder store.
pub struct ValidationWorker<V> {
    validator: Arc<V>,
    snapshots: watch::Receiver<DocumentSnapshot>,
    debounce: Duration,
    bridge: ValidationBridge,
    status: watch::Sender<ValidationStatus>,
}

impl<V: FableValidator + 'static> ValidationWorker<V> {
    /// Spawns the worker on the current tokio runtime.
    ///
    /// The task ends when the store feeding `snapshots` is dropped, or when
    /// the returned handle is.
    pub fn spawn(
        validator: Arc<V>,
        snapshots: watch::Receiver<DocumentSnapshot>,
        debounce: Duration,
    ) -> ValidationHandle {
        let (status, status_rx) = watch::channel(ValidationStatus::default());
        let worker = Self {
            validator,
            snapshots,
            debounce,
            bridge: ValidationBridge::new(),
            status,
        };
        ValidationHandle {
            status: status_rx,
            task: tokio::spawn(worker.run()),
        }
    }

    async fn run(mut self) {
        // The snapshot present at start counts as a change.
        let mut pending = true;
        loop {
            if !pending && self.snapshots.changed().await.is_err() {
                break;
            }
            pending = false;

            if !self.wait_until_quiet().await {
                break;
            }

            let snapshot = self.snapshots.borrow_and_update().clone();
            let Some(ticket) = self.bridge.begin(&snapshot) else {
                self.publish();
                continue;
            };
            self.publish();

            let result = self.validator.expand(&ticket.document).await;
            let current = self.snapshots.borrow().version;
            let update = self.bridge.complete(&ticket, result, current);
            debug!(?update, "Validation round finished");
            self.publish();
        }
        debug!("Snapshot channel closed, validation worker stopping");
    }

    /// Waits until no new snapshot arrives for a full debounce window.
    /// Returns `false` if the store went away meanwhile.
    async fn wait_until_quiet(&mut self) -> bool {
        loop {
            match timeout(self.debounce, self.snapshots.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) => return false,
                Err(_) => return true,
            }
        }
    }

    fn publish(&self) {
        self.status.send_replace(self.bridge.status().clone());
    }
}

/// Access to a running [`ValidationWorker`]. Dropping it stops the worker.
pub struct ValidationHandle {
    status: watch::Receiver<ValidationStatus>,
    task: JoinHandle<()>,
}

impl ValidationHandle {
    /// The latest published status.
    pub fn status(&self) -> ValidationStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ValidationStatus> {
        self.status.clone()
    }

    /// Waits until the published status satisfies `predicate`.
    /// Returns `None` if the worker stopped first.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&ValidationStatus) -> bool,
    ) -> Option<ValidationStatus> {
        self.status
            .wait_for(predicate)
            .await
            .ok()
            .map(|status| status.clone())
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ValidationHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
