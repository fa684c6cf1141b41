//! Background notification poller wiring.
//!
//! Adapts the storage and dispatch layers to the poller's boundary traits
//! and spawns the loop as a tokio task with a watch-channel shutdown.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use chores_core::{ChoresError, Task};
use chores_notify::Dispatcher;
use chores_schedule::{DueTaskSink, NotificationPoller, TaskSource};
use chores_storage::JsonStore;

use crate::state::AppState;

struct StoreTaskSource {
    store: Arc<JsonStore>,
}

#[async_trait]
impl TaskSource for StoreTaskSource {
    async fn list_tasks(&self) -> Result<Vec<Task>, ChoresError> {
        Ok(self.store.tasks())
    }
}

/// Dispatch boundary: re-reads the device registry on every dispatch so
/// device edits apply without restart.
struct DispatchSink {
    store: Arc<JsonStore>,
    dispatcher: Arc<Dispatcher>,
}

#[async_trait]
impl DueTaskSink for DispatchSink {
    async fn notify_due(&self, task: &Task) -> Result<(), ChoresError> {
        let devices = self.store.devices();
        let results = self.dispatcher.dispatch(task, &devices).await;
        let failed = results.iter().filter(|r| !r.success).count();
        if !results.is_empty() && failed == results.len() {
            return Err(ChoresError::Dispatch(format!(
                "all {failed} deliveries failed for task {}",
                task.id
            )));
        }
        Ok(())
    }
}

/// Spawn the notification poller. The returned sender stops the loop at its
/// next sleep point.
pub fn spawn_poller(state: &Arc<AppState>) -> (JoinHandle<()>, watch::Sender<bool>) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let poller = NotificationPoller::new(
        state.policy,
        StoreTaskSource {
            store: state.store.clone(),
        },
        DispatchSink {
            store: state.store.clone(),
            dispatcher: state.dispatcher.clone(),
        },
        Duration::from_secs(state.config.schedule.poll_interval_secs),
    );

    let handle = tokio::spawn(poller.run(shutdown_rx));
    (handle, shutdown_tx)
}
