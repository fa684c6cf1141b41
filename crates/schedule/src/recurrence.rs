//! Recurrence calculation with calendar-month clamping and canonical
//! notification times.
//!
//! All date arithmetic happens on the local calendar of the configured IANA
//! zone. Month-based steps clamp a nonexistent day-of-month to the last day
//! of the target month (Jan 31 + 1 month = Feb 28/29), never overflowing
//! into the following month. The resulting date is then normalized to the
//! canonical hour for its weekday/weekend classification.

use chrono::{
    DateTime, Datelike, Days, FixedOffset, Months, NaiveDate, TimeZone, Timelike, Utc, Weekday,
};
use chrono_tz::Tz;

use chores_core::{ChoresError, Frequency};

/// Minutes past the canonical hour during which due tasks may fire.
pub const FIRING_WINDOW_MINUTES: u32 = 5;

/// Process-wide scheduling policy: the operating timezone and the two
/// canonical notification hours. Configured once at startup, never per task.
#[derive(Debug, Clone, Copy)]
pub struct SchedulePolicy {
    tz: Tz,
    weekday_hour: u32,
    weekend_hour: u32,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            tz: chrono_tz::Europe::Stockholm,
            weekday_hour: 16,
            weekend_hour: 8,
        }
    }
}

impl SchedulePolicy {
    pub fn new(tz: Tz, weekday_hour: u32, weekend_hour: u32) -> Self {
        Self {
            tz,
            weekday_hour,
            weekend_hour,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Current instant in the configured timezone, read from the live clock.
    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    /// Monday through Friday.
    pub fn is_weekday(date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// The canonical notification hour for a calendar date.
    pub fn canonical_hour(&self, date: NaiveDate) -> u32 {
        if Self::is_weekday(date) {
            self.weekday_hour
        } else {
            self.weekend_hour
        }
    }

    /// The canonical notification instant for a calendar date: the weekday or
    /// weekend hour with minutes and seconds zeroed, in the configured zone.
    ///
    /// On a DST fold the earlier instant wins; a local time that does not
    /// exist at all is an error rather than a panic.
    pub fn notification_time(&self, date: NaiveDate) -> Result<DateTime<Tz>, ChoresError> {
        let hour = self.canonical_hour(date);
        self.tz
            .with_ymd_and_hms(date.year(), date.month(), date.day(), hour, 0, 0)
            .earliest()
            .ok_or_else(|| {
                ChoresError::DateOutOfRange(format!(
                    "{date} {hour:02}:00 does not exist in {}",
                    self.tz
                ))
            })
    }

    /// Advance `last_done` by one recurrence unit and normalize the result to
    /// the canonical notification time of the resulting date.
    ///
    /// Deterministic and side-effect free. The returned timestamp carries the
    /// configured zone's offset for the resulting local time.
    pub fn compute_next_due(
        &self,
        frequency: Frequency,
        last_done: DateTime<FixedOffset>,
    ) -> Result<DateTime<FixedOffset>, ChoresError> {
        let reference = last_done.with_timezone(&self.tz).date_naive();
        let next_date = match frequency {
            Frequency::Daily => reference.checked_add_days(Days::new(1)),
            Frequency::Weekly => reference.checked_add_days(Days::new(7)),
            // checked_add_months clamps the day to the last day of the
            // target month and rolls the year past December.
            Frequency::Monthly => reference.checked_add_months(Months::new(1)),
            Frequency::Quarterly => reference.checked_add_months(Months::new(3)),
            Frequency::Yearly => reference.checked_add_months(Months::new(12)),
        }
        .ok_or_else(|| ChoresError::DateOutOfRange(format!("{frequency} after {reference}")))?;

        Ok(self.notification_time(next_date)?.fixed_offset())
    }

    /// The firing window for one instant. Recomputed every poll tick,
    /// never persisted.
    pub fn window_at(&self, now: DateTime<Tz>) -> NotificationWindow {
        let date = now.date_naive();
        NotificationWindow {
            now,
            weekday: Self::is_weekday(date),
            canonical_hour: self.canonical_hour(date),
        }
    }
}

/// One instant classified as weekday/weekend, with the canonical hour for
/// that classification.
#[derive(Debug, Clone, Copy)]
pub struct NotificationWindow {
    pub now: DateTime<Tz>,
    pub weekday: bool,
    pub canonical_hour: u32,
}

impl NotificationWindow {
    /// Whether notifications may fire right now: within the first
    /// [`FIRING_WINDOW_MINUTES`] minutes of the canonical hour.
    ///
    /// The poller's minute guard is the primary de-dupe; this bound keeps a
    /// late or restarted poller from firing across the rest of the hour.
    pub fn is_open(&self) -> bool {
        self.now.hour() == self.canonical_hour && self.now.minute() < FIRING_WINDOW_MINUTES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> SchedulePolicy {
        SchedulePolicy::default()
    }

    fn dt(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    // ── compute_next_due — spec scenarios ───────────────────────────

    #[test]
    fn weekly_lands_on_next_weekday_hour() {
        // 2024-05-06 is a Monday; +7 days is again a Monday → 16:00.
        let next = policy()
            .compute_next_due(Frequency::Weekly, dt("2024-05-06T08:00:00+02:00"))
            .unwrap();
        assert_eq!(next, dt("2024-05-13T16:00:00+02:00"));
    }

    #[test]
    fn monthly_clamps_jan_31_to_leap_feb_29() {
        let next = policy()
            .compute_next_due(Frequency::Monthly, dt("2024-01-31T16:00:00+01:00"))
            .unwrap();
        assert_eq!(next, dt("2024-02-29T16:00:00+01:00"));
    }

    #[test]
    fn quarterly_rolls_year_and_clamps_to_feb_28() {
        // Nov + 3 months = Feb of the next year; 2025 is not a leap year,
        // and 2025-02-28 is a Friday → weekday hour.
        let next = policy()
            .compute_next_due(Frequency::Quarterly, dt("2024-11-30T08:00:00+01:00"))
            .unwrap();
        assert_eq!(next, dt("2025-02-28T16:00:00+01:00"));
    }

    #[test]
    fn daily_onto_weekend_uses_weekend_hour() {
        // 2024-05-03 is a Friday; the next day is a Saturday → 08:00.
        let next = policy()
            .compute_next_due(Frequency::Daily, dt("2024-05-03T16:00:00+02:00"))
            .unwrap();
        assert_eq!(next, dt("2024-05-04T08:00:00+02:00"));
    }

    #[test]
    fn yearly_clamps_leap_day() {
        let next = policy()
            .compute_next_due(Frequency::Yearly, dt("2024-02-29T08:00:00+01:00"))
            .unwrap();
        assert_eq!(next, dt("2025-02-28T16:00:00+01:00"));
    }

    #[test]
    fn yearly_preserves_month_and_day() {
        let next = policy()
            .compute_next_due(Frequency::Yearly, dt("2024-07-15T16:00:00+02:00"))
            .unwrap();
        assert_eq!(next, dt("2025-07-15T16:00:00+02:00"));
    }

    #[test]
    fn monthly_never_overflows_into_month_after_next() {
        // Aug 31 + 1 month must be Sep 30, not Oct 1.
        let next = policy()
            .compute_next_due(Frequency::Monthly, dt("2024-08-31T08:00:00+02:00"))
            .unwrap();
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2024, 9, 30).unwrap());
    }

    // ── Laws ────────────────────────────────────────────────────────

    #[test]
    fn compute_next_due_is_deterministic() {
        let p = policy();
        let reference = dt("2024-03-14T09:26:53+01:00");
        for freq in Frequency::ALL {
            let a = p.compute_next_due(freq, reference).unwrap();
            let b = p.compute_next_due(freq, reference).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn canonical_time_law_holds_across_a_fortnight() {
        // Daily recurrence walked across two weeks covers every weekday and
        // weekend classification.
        let p = policy();
        let mut current = dt("2024-05-06T12:34:56+02:00");
        for _ in 0..14 {
            current = p.compute_next_due(Frequency::Daily, current).unwrap();
            let local = current.with_timezone(&p.timezone());
            let expected_hour = if SchedulePolicy::is_weekday(local.date_naive()) {
                16
            } else {
                8
            };
            assert_eq!(local.hour(), expected_hour, "at {local}");
            assert_eq!(local.minute(), 0);
            assert_eq!(local.second(), 0);
            assert_eq!(local.nanosecond(), 0);
        }
    }

    #[test]
    fn classification_uses_resulting_date_not_reference() {
        // Reference is a Sunday (weekend); result is a Monday → weekday hour.
        let next = policy()
            .compute_next_due(Frequency::Daily, dt("2024-05-05T08:00:00+02:00"))
            .unwrap();
        assert_eq!(next, dt("2024-05-06T16:00:00+02:00"));
    }

    #[test]
    fn offset_follows_dst_of_resulting_date() {
        // Stockholm switched to CEST on 2024-03-31; the canonical instant on
        // the resulting date carries the new offset.
        let next = policy()
            .compute_next_due(Frequency::Daily, dt("2024-03-30T08:00:00+01:00"))
            .unwrap();
        assert_eq!(next, dt("2024-03-31T08:00:00+02:00"));
    }

    // ── Window ──────────────────────────────────────────────────────

    fn stockholm(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        chrono_tz::Europe::Stockholm
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
    }

    #[test]
    fn window_open_within_first_five_minutes_of_weekend_hour() {
        // 2024-05-04 is a Saturday.
        let window = policy().window_at(stockholm(2024, 5, 4, 8, 2));
        assert!(!window.weekday);
        assert_eq!(window.canonical_hour, 8);
        assert!(window.is_open());
    }

    #[test]
    fn window_closed_past_five_minutes() {
        let window = policy().window_at(stockholm(2024, 5, 4, 8, 6));
        assert!(!window.is_open());
    }

    #[test]
    fn window_closed_at_wrong_hour() {
        // Weekend morning hour on a weekday does not open the window.
        let window = policy().window_at(stockholm(2024, 5, 6, 8, 2));
        assert!(window.weekday);
        assert_eq!(window.canonical_hour, 16);
        assert!(!window.is_open());
    }

    #[test]
    fn window_opens_at_weekday_hour() {
        let window = policy().window_at(stockholm(2024, 5, 6, 16, 0));
        assert!(window.is_open());
    }

    #[test]
    fn custom_hours_respected() {
        let p = SchedulePolicy::new(chrono_tz::Europe::Stockholm, 18, 10);
        let next = p
            .compute_next_due(Frequency::Weekly, dt("2024-05-06T08:00:00+02:00"))
            .unwrap();
        assert_eq!(next, dt("2024-05-13T18:00:00+02:00"));
        assert!(p.window_at(stockholm(2024, 5, 4, 10, 1)).is_open());
    }
}
