//! Fans a due task out to its assigned devices.
//!
//! Deliveries run sequentially in the task's assignment order. An unknown
//! device or a failed delivery is logged and skipped; it never blocks the
//! remaining devices.

use std::collections::HashMap;
use std::sync::Arc;

use chores_core::{Device, Task};

use crate::traits::{DispatchResult, Notification, NotificationAction, Notifier};

pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Build the reminder notification for a task, with Done/Postpone action
    /// buttons the mobile app echoes back through `/ha/action`.
    pub fn reminder_for(task: &Task) -> Notification {
        Notification {
            title: "Household Chore Reminder".to_string(),
            message: format!("Time to: {}", task.name),
            actions: vec![
                NotificationAction {
                    action: format!("TASK_DONE_{}", task.id),
                    title: "Done".to_string(),
                },
                NotificationAction {
                    action: format!("TASK_POSTPONE_{}", task.id),
                    title: "Postpone".to_string(),
                },
            ],
            data: serde_json::json!({ "task_id": task.id }),
        }
    }

    /// Send the reminder for `task` to each of its assigned devices.
    ///
    /// `devices` is the device registry; assigned IDs missing from it are
    /// logged and skipped. Returns one result per attempted delivery.
    pub async fn dispatch(&self, task: &Task, devices: &[Device]) -> Vec<DispatchResult> {
        if task.assigned_to.is_empty() {
            tracing::warn!(task_id = %task.id, "Task has no assigned devices");
            return Vec::new();
        }

        let by_id: HashMap<&str, &Device> =
            devices.iter().map(|d| (d.id.as_str(), d)).collect();
        let notification = Self::reminder_for(task);

        let mut results = Vec::with_capacity(task.assigned_to.len());

        for device_id in &task.assigned_to {
            let Some(device) = by_id.get(device_id.as_str()) else {
                tracing::warn!(task_id = %task.id, device_id = %device_id, "Device not found");
                continue;
            };

            let start = std::time::Instant::now();
            let result = self.notifier.send(&device.notify_service, &notification).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let (success, error) = match result {
                Ok(()) => {
                    tracing::info!(
                        task_id = %task.id,
                        device_id = %device_id,
                        channel = self.notifier.channel_name(),
                        duration_ms,
                        "Notification delivered"
                    );
                    (true, None)
                }
                Err(e) => {
                    tracing::warn!(
                        task_id = %task.id,
                        device_id = %device_id,
                        error = %e,
                        duration_ms,
                        "Notification delivery failed"
                    );
                    (false, Some(e.to_string()))
                }
            };

            results.push(DispatchResult {
                device_id: device_id.clone(),
                success,
                error,
                duration_ms,
            });
        }

        results
    }
}
