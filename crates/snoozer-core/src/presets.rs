//! Context-aware quick snooze options.
//!
//! The option list shifts with the time of day: mornings offer "Today 2 PM",
//! afternoons "Today 6 PM", evenings "Tomorrow 9 AM". Saturday drops the
//! weekend option, and Monday before 09:00 drops "Mon 9 AM" (it would mean
//! "in a few minutes", not "next week"). Pure over the injected `now`.

use chrono::{NaiveDateTime, Timelike, Weekday};
use serde::Serialize;

use crate::clock::{hours_until, hours_until_weekday, weekday_num, TimeOfDay};

/// One quick-pick snooze choice.
#[derive(Debug, Clone, Serialize)]
pub struct SnoozeOption {
    /// Stable identifier, usable as a CLI preset name.
    pub id: &'static str,
    /// Human label, e.g. "Today 2 PM".
    pub label: &'static str,
    /// Offset from now, fractional hours.
    pub hours: f64,
}

const fn tod(hour: u32, minute: u32) -> TimeOfDay {
    TimeOfDay::at(hour, minute)
}

/// The quick-pick options valid at `now`.
pub fn smart_options(now: NaiveDateTime) -> Vec<SnoozeOption> {
    let hour = now.hour();
    let day = weekday_num(&now);
    let mut options = vec![
        SnoozeOption {
            id: "10min",
            label: "10 min",
            hours: 0.17,
        },
        SnoozeOption {
            id: "1hour",
            label: "1 hour",
            hours: 1.0,
        },
    ];

    if hour < 12 {
        options.push(SnoozeOption {
            id: "afternoon",
            label: "Today 2 PM",
            hours: hours_until(now, tod(14, 0), 0),
        });
    } else if hour < 17 {
        options.push(SnoozeOption {
            id: "evening",
            label: "Today 6 PM",
            hours: hours_until(now, tod(18, 0), 0),
        });
    } else {
        options.push(SnoozeOption {
            id: "next-morning",
            label: "Tomorrow 9 AM",
            hours: hours_until(now, tod(9, 0), 1),
        });
    }

    if day < 6 {
        options.push(SnoozeOption {
            id: "weekend",
            label: "Sat 10 AM",
            hours: hours_until_weekday(now, Weekday::Sat, tod(10, 0)),
        });
    }
    if day != 1 || hour >= 9 {
        options.push(SnoozeOption {
            id: "next-week",
            label: "Mon 9 AM",
            hours: hours_until_weekday(now, Weekday::Mon, tod(9, 0)),
        });
    }

    options
}

/// Look up a preset by id at `now`.
pub fn find_option(now: NaiveDateTime, id: &str) -> Option<SnoozeOption> {
    smart_options(now).into_iter().find(|o| o.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        // January 2024: the 8th is a Monday.
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn ids(now: NaiveDateTime) -> Vec<&'static str> {
        smart_options(now).iter().map(|o| o.id).collect()
    }

    #[test]
    fn morning_offers_afternoon() {
        let got = ids(at(9, 8)); // Tuesday 08:00
        assert!(got.contains(&"afternoon"));
        assert!(!got.contains(&"evening"));
        assert!(!got.contains(&"next-morning"));
    }

    #[test]
    fn afternoon_offers_evening() {
        let got = ids(at(9, 13)); // Tuesday 13:00
        assert!(got.contains(&"evening"));
    }

    #[test]
    fn evening_offers_tomorrow_morning() {
        let got = ids(at(9, 20)); // Tuesday 20:00
        assert!(got.contains(&"next-morning"));
        let opt = find_option(at(9, 20), "next-morning").unwrap();
        assert_eq!(opt.hours, 13.0); // 20:00 -> 09:00 next day
    }

    #[test]
    fn saturday_drops_weekend_option() {
        let got = ids(at(13, 10)); // Saturday 10:00
        assert!(!got.contains(&"weekend"));
        assert!(got.contains(&"next-week"));
    }

    #[test]
    fn early_monday_drops_next_week() {
        // Monday 08:00: "Mon 9 AM" would fire in an hour.
        let got = ids(at(8, 8));
        assert!(!got.contains(&"next-week"));
        // By 09:00 it is back, pointing a week out.
        let got = ids(at(8, 9));
        assert!(got.contains(&"next-week"));
    }

    #[test]
    fn quick_options_always_present() {
        for h in [0, 6, 12, 18, 23] {
            let got = ids(at(10, h));
            assert_eq!(&got[..2], &["10min", "1hour"]);
        }
    }
}
