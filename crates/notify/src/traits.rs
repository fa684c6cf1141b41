//! Notifier trait definition and shared types.

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// An actionable button attached to a mobile push notification.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NotificationAction {
    /// Action identifier echoed back by the mobile app (e.g. `TASK_DONE_ab12cd34`).
    pub action: String,
    /// Button label.
    pub title: String,
}

/// A rendered notification ready for delivery.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    /// Action buttons, delivered inside the payload's `data.actions`.
    pub actions: Vec<NotificationAction>,
    /// Additional payload data (e.g. the task id).
    pub data: serde_json::Value,
}

/// Trait for notification transport implementations.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification through the named notify service.
    async fn send(
        &self,
        notify_service: &str,
        notification: &Notification,
    ) -> Result<(), NotifyError>;

    /// Probe transport connectivity. Failures are logged, not raised.
    async fn check_connection(&self) -> bool;

    /// Human-readable name for this transport.
    fn channel_name(&self) -> &str;
}

/// Result of delivering one notification to one device.
#[derive(Debug)]
pub struct DispatchResult {
    pub device_id: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
