//! Notification-eligibility polling loop.
//!
//! A single cooperative loop owns all poller state. Each tick re-reads the
//! live clock, so timezone or clock changes take effect without a restart.
//! A tick runs at most once per calendar minute; due-but-unfired tasks stay
//! candidates on every later qualifying window until completed.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Timelike};
use chrono_tz::Tz;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use chores_core::{ChoresError, Task};

use crate::recurrence::SchedulePolicy;

/// Wall-clock sleep between ticks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Read side of the task store, as seen by the poller.
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<Task>, ChoresError>;
}

/// Dispatch boundary: receives each task exactly once per firing window.
#[async_trait]
pub trait DueTaskSink: Send + Sync {
    async fn notify_due(&self, task: &Task) -> Result<(), ChoresError>;
}

/// What a single tick did.
#[derive(Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// An earlier tick already handled this calendar minute.
    MinuteAlreadyProcessed,
    Processed {
        /// Tasks with `next_due <= now`, whether or not the window was open.
        candidates: usize,
        /// Candidates handed to the sink successfully.
        fired: usize,
        /// Candidates whose dispatch errored (logged, no retry).
        failed: usize,
    },
}

/// Scans the task store once per minute and hands due tasks to the dispatch
/// boundary while the firing window is open.
pub struct NotificationPoller<S, D> {
    policy: SchedulePolicy,
    source: S,
    sink: D,
    interval: Duration,
    /// Minute-of-hour most recently processed. `None` until the first tick,
    /// and again after every restart — a restart inside an open window may
    /// therefore fire a second time (at-least-once across restarts).
    last_processed_minute: Option<u32>,
}

impl<S: TaskSource, D: DueTaskSink> NotificationPoller<S, D> {
    pub fn new(policy: SchedulePolicy, source: S, sink: D, interval: Duration) -> Self {
        Self {
            policy,
            source,
            sink,
            interval,
            last_processed_minute: None,
        }
    }

    /// Run one tick against an explicit clock reading.
    ///
    /// Dispatch failures are logged and counted but never propagate; only a
    /// store read failure surfaces as `Err`, for the loop to log and ride out.
    pub async fn tick_at(&mut self, now: DateTime<Tz>) -> Result<TickOutcome, ChoresError> {
        let minute = now.minute();
        if self.last_processed_minute == Some(minute) {
            return Ok(TickOutcome::MinuteAlreadyProcessed);
        }
        // Consume the minute before due-checking so overlapping polls within
        // the same minute cannot double-fire.
        self.last_processed_minute = Some(minute);

        let window = self.policy.window_at(now);
        let tasks = self.source.list_tasks().await?;

        let mut candidates = 0;
        let mut fired = 0;
        let mut failed = 0;

        for task in &tasks {
            if task.next_due > now {
                continue;
            }
            candidates += 1;

            if !window.is_open() {
                continue;
            }

            match self.sink.notify_due(task).await {
                Ok(()) => {
                    fired += 1;
                    info!(task_id = %task.id, name = %task.name, "Due task dispatched");
                }
                Err(e) => {
                    failed += 1;
                    warn!(
                        task_id = %task.id,
                        error = %e,
                        "Dispatch failed — task stays due for the next window"
                    );
                }
            }
        }

        Ok(TickOutcome::Processed {
            candidates,
            fired,
            failed,
        })
    }

    /// Main loop. Ticks, then sleeps [`interval`](Self::new), observing the
    /// shutdown channel at the sleep point. A failing tick never terminates
    /// the loop.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            tz = %self.policy.timezone(),
            "Notification poller started"
        );

        loop {
            let now = self.policy.now();
            match self.tick_at(now).await {
                Ok(TickOutcome::MinuteAlreadyProcessed) => {
                    debug!(minute = now.minute(), "Minute already processed, skipping");
                }
                Ok(TickOutcome::Processed {
                    candidates,
                    fired,
                    failed,
                }) => {
                    if candidates > 0 {
                        info!(candidates, fired, failed, "Poll tick complete");
                    } else {
                        debug!("Poll tick complete: nothing due");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Poll tick failed — continuing after sleep");
                }
            }

            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Notification poller stopping");
                    return;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use chrono::TimeZone;
    use chores_core::Frequency;

    struct FixedSource {
        tasks: Vec<Task>,
        fail: bool,
    }

    #[async_trait]
    impl TaskSource for FixedSource {
        async fn list_tasks(&self) -> Result<Vec<Task>, ChoresError> {
            if self.fail {
                return Err(ChoresError::Other("store unavailable".to_string()));
            }
            Ok(self.tasks.clone())
        }
    }

    #[derive(Clone)]
    struct CountingSink {
        sent: Arc<Mutex<Vec<String>>>,
        calls: Arc<AtomicUsize>,
        fail_for: Option<String>,
    }

    impl CountingSink {
        fn new() -> Self {
            Self {
                sent: Arc::new(Mutex::new(Vec::new())),
                calls: Arc::new(AtomicUsize::new(0)),
                fail_for: None,
            }
        }
    }

    #[async_trait]
    impl DueTaskSink for CountingSink {
        async fn notify_due(&self, task: &Task) -> Result<(), ChoresError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_for.as_deref() == Some(task.id.as_str()) {
                return Err(ChoresError::Dispatch("mock failure".to_string()));
            }
            self.sent.lock().unwrap().push(task.id.clone());
            Ok(())
        }
    }

    fn make_task(id: &str, next_due: &str) -> Task {
        let due = DateTime::parse_from_rfc3339(next_due).unwrap();
        Task {
            id: id.to_string(),
            name: format!("Task {id}"),
            frequency: Frequency::Weekly,
            last_done: due - chrono::Duration::days(7),
            next_due: due,
            assigned_to: vec!["johan_phone".to_string()],
        }
    }

    fn stockholm(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        chrono_tz::Europe::Stockholm
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
    }

    fn poller(tasks: Vec<Task>, sink: CountingSink) -> NotificationPoller<FixedSource, CountingSink> {
        NotificationPoller::new(
            SchedulePolicy::default(),
            FixedSource { tasks, fail: false },
            sink,
            DEFAULT_POLL_INTERVAL,
        )
    }

    // 2024-05-04 is a Saturday (weekend hour 8), 2024-05-06 a Monday.

    #[tokio::test]
    async fn due_task_fires_inside_weekend_window() {
        let sink = CountingSink::new();
        let mut p = poller(vec![make_task("t1", "2024-05-04T08:00:00+02:00")], sink.clone());

        let outcome = p.tick_at(stockholm(2024, 5, 4, 8, 2)).await.unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Processed { candidates: 1, fired: 1, failed: 0 }
        );
        assert_eq!(*sink.sent.lock().unwrap(), vec!["t1"]);
    }

    #[tokio::test]
    async fn due_task_does_not_fire_past_the_window() {
        let sink = CountingSink::new();
        let mut p = poller(vec![make_task("t1", "2024-05-04T08:00:00+02:00")], sink.clone());

        let outcome = p.tick_at(stockholm(2024, 5, 4, 8, 6)).await.unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Processed { candidates: 1, fired: 0, failed: 0 }
        );
        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn second_tick_in_same_minute_is_a_noop() {
        let sink = CountingSink::new();
        let mut p = poller(vec![make_task("t1", "2024-05-04T08:00:00+02:00")], sink.clone());

        let now = stockholm(2024, 5, 4, 8, 1);
        p.tick_at(now).await.unwrap();
        let second = p.tick_at(now + chrono::Duration::seconds(30)).await.unwrap();

        assert_eq!(second, TickOutcome::MinuteAlreadyProcessed);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn not_yet_due_task_is_not_a_candidate() {
        let sink = CountingSink::new();
        let mut p = poller(vec![make_task("t1", "2024-05-11T08:00:00+02:00")], sink.clone());

        let outcome = p.tick_at(stockholm(2024, 5, 4, 8, 0)).await.unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Processed { candidates: 0, fired: 0, failed: 0 }
        );
    }

    #[tokio::test]
    async fn long_overdue_task_still_fires_days_later() {
        // Due in April, never completed — fires in the Monday 16:00 window
        // weeks later.
        let sink = CountingSink::new();
        let mut p = poller(vec![make_task("t1", "2024-04-10T16:00:00+02:00")], sink.clone());

        let outcome = p.tick_at(stockholm(2024, 5, 6, 16, 4)).await.unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Processed { candidates: 1, fired: 1, failed: 0 }
        );
    }

    #[tokio::test]
    async fn overdue_task_waits_for_canonical_hour() {
        let sink = CountingSink::new();
        let mut p = poller(vec![make_task("t1", "2024-04-10T16:00:00+02:00")], sink.clone());

        // Midday Monday: candidate, but the window is shut.
        let outcome = p.tick_at(stockholm(2024, 5, 6, 12, 0)).await.unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Processed { candidates: 1, fired: 0, failed: 0 }
        );
    }

    #[tokio::test]
    async fn dispatch_failure_does_not_block_other_tasks() {
        let mut sink = CountingSink::new();
        sink.fail_for = Some("bad".to_string());
        let mut p = poller(
            vec![
                make_task("bad", "2024-05-04T08:00:00+02:00"),
                make_task("ok", "2024-05-04T08:00:00+02:00"),
            ],
            sink.clone(),
        );

        let outcome = p.tick_at(stockholm(2024, 5, 4, 8, 0)).await.unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Processed { candidates: 2, fired: 1, failed: 1 }
        );
        assert_eq!(*sink.sent.lock().unwrap(), vec!["ok"]);
    }

    #[tokio::test]
    async fn store_failure_surfaces_but_consumes_the_minute() {
        let sink = CountingSink::new();
        let mut p = NotificationPoller::new(
            SchedulePolicy::default(),
            FixedSource { tasks: Vec::new(), fail: true },
            sink,
            DEFAULT_POLL_INTERVAL,
        );

        let now = stockholm(2024, 5, 4, 8, 0);
        assert!(p.tick_at(now).await.is_err());
        // The failed tick still owns its minute; the next minute retries.
        assert_eq!(
            p.tick_at(now).await.unwrap(),
            TickOutcome::MinuteAlreadyProcessed
        );
    }

    #[tokio::test]
    async fn restart_inside_window_fires_again() {
        // The minute guard resets with the process; a restart mid-window
        // redelivers (deliberate at-least-once across restarts).
        let tasks = vec![make_task("t1", "2024-05-04T08:00:00+02:00")];
        let now = stockholm(2024, 5, 4, 8, 3);

        let first_sink = CountingSink::new();
        let mut first = poller(tasks.clone(), first_sink.clone());
        first.tick_at(now).await.unwrap();

        let second_sink = CountingSink::new();
        let mut second = poller(tasks, second_sink.clone());
        second.tick_at(now).await.unwrap();

        assert_eq!(first_sink.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_sink.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn tasks_dispatch_in_store_listing_order() {
        let sink = CountingSink::new();
        let mut p = poller(
            vec![
                make_task("a", "2024-05-04T08:00:00+02:00"),
                make_task("b", "2024-05-04T08:00:00+02:00"),
                make_task("c", "2024-05-04T08:00:00+02:00"),
            ],
            sink.clone(),
        );

        p.tick_at(stockholm(2024, 5, 4, 8, 0)).await.unwrap();
        assert_eq!(*sink.sent.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn run_exits_on_shutdown_signal() {
        let sink = CountingSink::new();
        let p = poller(Vec::new(), sink);
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(p.run(rx));
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("poller did not stop after shutdown signal")
            .unwrap();
    }
}
