//! Shared data models for tasks and notification-target devices.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::ChoresError;

/// How often a task repeats. Fixed set, no custom intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub const ALL: [Frequency; 5] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = ChoresError;

    /// Parse a frequency from its wire form. Anything outside the five
    /// supported values is an [`ChoresError::InvalidFrequency`] error for
    /// the caller to surface.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "quarterly" => Ok(Frequency::Quarterly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(ChoresError::InvalidFrequency(other.to_string())),
        }
    }
}

/// A recurring household chore.
///
/// `next_due` is always produced by the recurrence calculator, except after
/// an explicit postponement, which may leave it off the canonical hour until
/// the next completion cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Short unique identifier (truncated UUID).
    pub id: String,
    /// Human-readable task name.
    pub name: String,
    /// How often the task repeats.
    pub frequency: Frequency,
    /// When the task was last completed (RFC 3339 with offset).
    pub last_done: DateTime<FixedOffset>,
    /// When the task is next due (RFC 3339 with offset).
    pub next_due: DateTime<FixedOffset>,
    /// Ordered device IDs to notify when due.
    #[serde(default)]
    pub assigned_to: Vec<String>,
}

impl Task {
    /// Generate a new short task ID (first 8 hex chars of a v4 UUID).
    pub fn new_id() -> String {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(8);
        id
    }
}

/// A notification-target device (a phone registered in Home Assistant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Unique identifier, e.g. `johan_phone`.
    pub id: String,
    /// Home Assistant notify service, e.g. `notify.mobile_app_johans_iphone`.
    pub notify_service: String,
}
