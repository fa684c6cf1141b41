use std::sync::Arc;
use std::time::Instant;

use chores_notify::{Dispatcher, Notifier};
use chores_schedule::SchedulePolicy;
use chores_storage::JsonStore;

pub struct AppState {
    pub config: chores_core::Config,
    pub store: Arc<JsonStore>,
    pub notifier: Arc<dyn Notifier>,
    pub dispatcher: Arc<Dispatcher>,
    pub policy: SchedulePolicy,
    pub started_at: Instant,
}
