//! Wall-clock access for the calendar-driven filters.

use chrono::{Datelike, Local, NaiveDateTime, Weekday};

/// Source of the current local date and time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The system clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Saturday or Sunday.
pub fn is_weekend(at: &NaiveDateTime) -> bool {
    matches!(at.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_fixed_clock() {
        let instant = at(2024, 4, 1, 9);
        assert_eq!(FixedClock(instant).now(), instant);
    }

    #[test]
    fn test_is_weekend() {
        // 2024-04-06 is a Saturday
        assert!(is_weekend(&at(2024, 4, 6, 12)));
        assert!(is_weekend(&at(2024, 4, 7, 12)));
        assert!(!is_weekend(&at(2024, 4, 8, 12)));
        assert!(!is_weekend(&at(2024, 4, 5, 23)));
    }

    #[test]
    fn test_system_clock_is_recent() {
        let now = SystemClock.now();
        assert!(now.year() >= 2024);
    }
}
