//! Due-date recurrence and notification-eligibility scheduling.
//!
//! [`recurrence`] holds the pure calendar logic: advancing a task by one
//! recurrence unit and normalizing the result to the canonical notification
//! hour. [`poller`] holds the long-lived loop that decides, once per due
//! window, which tasks should be handed to the dispatch boundary.

pub mod poller;
pub mod recurrence;

pub use poller::{DueTaskSink, NotificationPoller, TaskSource, TickOutcome, DEFAULT_POLL_INTERVAL};
pub use recurrence::{NotificationWindow, SchedulePolicy, FIRING_WINDOW_MINUTES};
