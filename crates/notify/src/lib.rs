//! Notification transport and per-task dispatch.
//!
//! [`Notifier`] is the transport seam; [`HomeAssistantNotifier`] delivers
//! through the Home Assistant REST API. [`Dispatcher`] fans a due task out to
//! its assigned devices, one at a time, in assignment order.

pub mod dispatcher;
pub mod home_assistant;
pub mod traits;

pub use dispatcher::Dispatcher;
pub use home_assistant::HomeAssistantNotifier;
pub use traits::{DispatchResult, Notification, NotificationAction, Notifier, NotifyError};
