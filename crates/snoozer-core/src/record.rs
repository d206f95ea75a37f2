//! Snooze record and recurring schedule types.
//!
//! Everything the store persists is a [`StoredItem`]: a serde-tagged enum
//! whose `kind` field discriminates one-shot/recurring-cycle records from
//! recurring schedule configs. The tag is the source of truth for item
//! kind; key shapes only keep the flat namespace collision-free.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{TimeOfDay, WeekdaySet};

pub const RECORD_KEY_PREFIX: &str = "snooze";
pub const RECURRING_ID_PREFIX: &str = "recurring";

/// Composite key for one deferred tab: the originating tab id (or creation
/// timestamp when no tab id exists) plus the due instant. Renders as
/// `snooze-<origin>-<due_ms>`, which sorts and is trivially unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RecordKey {
    pub origin: i64,
    pub due_at_ms: i64,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{RECORD_KEY_PREFIX}-{}-{}", self.origin, self.due_at_ms)
    }
}

impl FromStr for RecordKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || format!("'{s}' is not a snooze key");
        let rest = s
            .strip_prefix(RECORD_KEY_PREFIX)
            .and_then(|r| r.strip_prefix('-'))
            .ok_or_else(bad)?;
        let (origin, due) = rest.rsplit_once('-').ok_or_else(bad)?;
        Ok(Self {
            origin: origin.parse().map_err(|_| bad())?,
            due_at_ms: due.parse().map_err(|_| bad())?,
        })
    }
}

impl Serialize for RecordKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One deferred tab, one-shot or a single cycle of a recurring series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnoozeRecord {
    pub key: RecordKey,
    pub url: String,
    pub title: String,
    /// Absolute wake-up instant, epoch milliseconds.
    pub due_at_ms: i64,
    /// Back-reference (not ownership) to a RecurringConfig.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_id: Option<String>,
    /// Delivery-in-flight flag; claimed before any side effect.
    #[serde(default)]
    pub processing: bool,
    /// When the processing claim was taken, epoch milliseconds. A claim
    /// older than the configured lease is treated as abandoned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at_ms: Option<i64>,
}

impl SnoozeRecord {
    pub fn is_recurring(&self) -> bool {
        self.recurring_id.is_some()
    }

    pub fn is_due(&self, now_ms: i64) -> bool {
        self.due_at_ms <= now_ms
    }
}

/// A saved weekly schedule, independent of any single due record.
///
/// Destroyed only by an explicit series-removal action, never by the
/// retirement of one cycle's record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringConfig {
    pub id: String,
    pub url: String,
    pub title: String,
    /// Target hour:minute, local wall clock.
    pub time: TimeOfDay,
    /// Weekdays the schedule fires on, 0 = Sunday .. 6 = Saturday.
    pub days: WeekdaySet,
}

impl RecurringConfig {
    pub fn new_id() -> String {
        format!("{RECURRING_ID_PREFIX}-{}", Uuid::new_v4())
    }
}

/// Everything the key-value store can hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoredItem {
    Record(SnoozeRecord),
    Recurring(RecurringConfig),
}

/// What to do with an existing snooze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CancelMode {
    /// Back out without touching anything.
    Cancel,
    /// Drop the record and its trigger; the tab stays closed.
    RemoveOnly,
    /// Drop the record and reopen its tab immediately.
    RemoveAndOpen,
    /// Recurring only: drop the record, its config, and reopen the tab.
    RemoveAllAndOpen,
    /// Recurring only: drop the record and its config; tab stays closed.
    RemoveSeriesOnly,
    /// Recurring only: reopen this occurrence, keep the series scheduled.
    RemoveSingleAndOpen,
}

impl CancelMode {
    /// Modes that terminate the whole recurring series.
    pub fn removes_series(&self) -> bool {
        matches!(self, Self::RemoveAllAndOpen | Self::RemoveSeriesOnly)
    }

    /// Modes that reopen the tab as part of cancellation.
    pub fn reopens(&self) -> bool {
        matches!(
            self,
            Self::RemoveAndOpen | Self::RemoveAllAndOpen | Self::RemoveSingleAndOpen
        )
    }

    /// Modes meaningful only for records that are part of a series.
    pub fn requires_recurring(&self) -> bool {
        matches!(
            self,
            Self::RemoveAllAndOpen | Self::RemoveSeriesOnly | Self::RemoveSingleAndOpen
        )
    }
}

/// Result of a cancellation, for the caller's display.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CancelOutcome {
    pub removed_record: bool,
    pub removed_config: bool,
    pub reopened: bool,
}

/// All snoozes, partitioned for display. Read-only snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SnoozeList {
    /// One-shot records, ascending by due instant.
    pub one_shot: Vec<SnoozeRecord>,
    /// Recurring-cycle records, ascending by due instant.
    pub recurring: Vec<SnoozeRecord>,
    /// The schedule configs behind the recurring records.
    pub configs: Vec<RecurringConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_key_roundtrip() {
        let key = RecordKey {
            origin: 42,
            due_at_ms: 1_700_000_000_000,
        };
        let rendered = key.to_string();
        assert_eq!(rendered, "snooze-42-1700000000000");
        assert_eq!(rendered.parse::<RecordKey>().unwrap(), key);
    }

    #[test]
    fn record_key_rejects_foreign_strings() {
        assert!("recurring-abc".parse::<RecordKey>().is_err());
        assert!("snooze-".parse::<RecordKey>().is_err());
        assert!("snooze-12".parse::<RecordKey>().is_err());
    }

    #[test]
    fn stored_item_kind_tag() {
        let record = SnoozeRecord {
            key: RecordKey {
                origin: 7,
                due_at_ms: 1_000,
            },
            url: "https://example.com".into(),
            title: "Example".into(),
            due_at_ms: 1_000,
            recurring_id: None,
            processing: false,
            claimed_at_ms: None,
        };
        let json = serde_json::to_value(StoredItem::Record(record)).unwrap();
        assert_eq!(json["kind"], "record");

        let config = RecurringConfig {
            id: RecurringConfig::new_id(),
            url: "https://example.com".into(),
            title: "Example".into(),
            time: "09:00".parse().unwrap(),
            days: crate::clock::WeekdaySet::new(&[1, 3, 5]).unwrap(),
        };
        let json = serde_json::to_value(StoredItem::Recurring(config)).unwrap();
        assert_eq!(json["kind"], "recurring");
        assert_eq!(json["time"], "09:00");
    }

    #[test]
    fn recurring_ids_are_namespaced() {
        let id = RecurringConfig::new_id();
        assert!(id.starts_with("recurring-"));
        assert!(id.parse::<RecordKey>().is_err());
    }
}
