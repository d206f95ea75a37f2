//! Wall-clock arithmetic for snooze targets.
//!
//! All functions here are pure over an injected `now` so that tests can pin
//! the clock. They operate on naive local wall-clock time (the host clock is
//! the only timezone this system knows about); conversion to an absolute
//! epoch-millisecond instant happens once, at [`local_epoch_ms`].

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Local, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Weekday};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// A target wall-clock time of day, parsed from "HH:mm".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::BadTimeFormat(format!("{hour}:{minute}")));
        }
        Ok(Self { hour, minute })
    }

    /// Constructor for compile-time-known valid times (presets).
    pub(crate) const fn at(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    fn as_naive_time(&self) -> NaiveTime {
        // Fields are range-checked at construction.
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or_default()
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ValidationError::BadTimeFormat(s.to_string());
        let (h, m) = s.split_once(':').ok_or_else(bad)?;
        let hour: u32 = h.trim().parse().map_err(|_| bad())?;
        let minute: u32 = m.trim().parse().map_err(|_| bad())?;
        Self::new(hour, minute).map_err(|_| bad())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// A non-empty set of weekdays, numbered 0 = Sunday .. 6 = Saturday.
///
/// Emptiness is rejected at construction, so every call site downstream
/// (notably [`next_occurrence`]) is guaranteed a terminating search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WeekdaySet(Vec<u8>);

impl WeekdaySet {
    pub fn new(days: &[u8]) -> Result<Self, ValidationError> {
        if days.is_empty() {
            return Err(ValidationError::EmptyDays);
        }
        if let Some(&bad) = days.iter().find(|&&d| d > 6) {
            return Err(ValidationError::BadWeekday(bad));
        }
        let mut days = days.to_vec();
        days.sort_unstable();
        days.dedup();
        Ok(Self(days))
    }

    pub fn contains(&self, day: u8) -> bool {
        self.0.contains(&day)
    }

    pub fn days(&self) -> &[u8] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for WeekdaySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let days = Vec::<u8>::deserialize(deserializer)?;
        Self::new(&days).map_err(D::Error::custom)
    }
}

/// Weekday number of a date, 0 = Sunday .. 6 = Saturday.
pub fn weekday_num(dt: &NaiveDateTime) -> u8 {
    dt.weekday().num_days_from_sunday() as u8
}

/// Fractional hours from `now` until the next wall-clock instant matching
/// `target`. With `min_days_ahead > 0` the candidate is pushed that many
/// days out unconditionally; otherwise a target already reached today rolls
/// over to tomorrow. Never negative.
pub fn hours_until(now: NaiveDateTime, target: TimeOfDay, min_days_ahead: u32) -> f64 {
    let mut candidate = now.date().and_time(target.as_naive_time());
    if min_days_ahead > 0 {
        candidate += Duration::days(i64::from(min_days_ahead));
    } else if candidate <= now {
        candidate += Duration::days(1);
    }
    (candidate - now).num_milliseconds() as f64 / MS_PER_HOUR
}

/// Fractional hours from `now` until the next strictly-future instant
/// matching `target` on `weekday`.
pub fn hours_until_weekday(now: NaiveDateTime, weekday: Weekday, target: TimeOfDay) -> f64 {
    let mut candidate = now.date().and_time(target.as_naive_time());
    while candidate.weekday() != weekday || candidate <= now {
        candidate += Duration::days(1);
    }
    (candidate - now).num_milliseconds() as f64 / MS_PER_HOUR
}

/// Earliest future instant matching `target` on a weekday in `days`.
///
/// If today's target has already passed, the search starts from tomorrow,
/// then advances day-by-day until the weekday matches. Completes within 7
/// day-steps because `days` is non-empty by construction.
pub fn next_occurrence(now: NaiveDateTime, target: TimeOfDay, days: &WeekdaySet) -> NaiveDateTime {
    let mut candidate = now.date().and_time(target.as_naive_time());
    if candidate <= now {
        candidate += Duration::days(1);
    }
    while !days.contains(weekday_num(&candidate)) {
        candidate += Duration::days(1);
    }
    candidate
}

/// Resolve a naive local wall-clock instant to epoch milliseconds.
///
/// An ambiguous wall time (clocks rolled back) resolves to the earlier
/// instant; a wall time skipped by a DST transition is stepped forward in
/// 15-minute increments until it exists.
pub fn local_epoch_ms(mut naive: NaiveDateTime) -> i64 {
    loop {
        match Local.from_local_datetime(&naive) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                return dt.timestamp_millis();
            }
            LocalResult::None => naive += Duration::minutes(15),
        }
    }
}

/// The host's current naive local wall-clock time.
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}
