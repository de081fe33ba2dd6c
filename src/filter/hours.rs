//! Business-hours odds: how likely a request is at a given weekday and hour.
//!
//! The default curve ramps up in the morning, dips at lunch, peaks in the
//! afternoon and tails off in the evening; weekends are lower and flatter.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::clock::is_weekend;

/// Odds applying to the inclusive hour range `from..=to`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourBand {
    pub from: u32,
    pub to: u32,
    pub odds: f64,
}

impl HourBand {
    pub const fn new(from: u32, to: u32, odds: f64) -> Self {
        Self { from, to, odds }
    }

    pub fn contains(&self, hour: u32) -> bool {
        self.from <= hour && hour <= self.to
    }
}

/// Odds table for weekdays and weekends.
///
/// The first band containing the hour wins; hours outside every band use
/// `off_hours`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkingHoursProfile {
    pub weekday: Vec<HourBand>,
    pub weekend: Vec<HourBand>,
    pub off_hours: f64,
}

impl Default for WorkingHoursProfile {
    fn default() -> Self {
        Self {
            weekday: vec![
                HourBand::new(7, 8, 0.3),
                HourBand::new(9, 11, 0.7),
                HourBand::new(12, 12, 0.5),
                HourBand::new(13, 16, 1.0),
                HourBand::new(17, 18, 0.6),
                HourBand::new(19, 21, 0.3),
            ],
            weekend: vec![HourBand::new(10, 20, 0.4)],
            off_hours: 0.1,
        }
    }
}

impl WorkingHoursProfile {
    /// Probability in `[0, 1]` of letting a request through at `at`.
    pub fn odds(&self, at: &NaiveDateTime) -> f64 {
        let bands = if is_weekend(at) { &self.weekend } else { &self.weekday };
        let hour = at.hour();

        bands
            .iter()
            .find(|band| band.contains(hour))
            .map(|band| band.odds)
            .unwrap_or(self.off_hours)
            .clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        // April 2024: the 1st is a Monday, the 6th a Saturday
        NaiveDate::from_ymd_opt(2024, 4, day)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_weekday_curve() {
        let profile = WorkingHoursProfile::default();
        assert_eq!(profile.odds(&at(1, 3)), 0.1);
        assert_eq!(profile.odds(&at(1, 8)), 0.3);
        assert_eq!(profile.odds(&at(1, 10)), 0.7);
        assert_eq!(profile.odds(&at(1, 12)), 0.5);
        assert_eq!(profile.odds(&at(1, 14)), 1.0);
        assert_eq!(profile.odds(&at(1, 18)), 0.6);
        assert_eq!(profile.odds(&at(1, 20)), 0.3);
        assert_eq!(profile.odds(&at(1, 23)), 0.1);
    }

    #[test]
    fn test_weekend_curve() {
        let profile = WorkingHoursProfile::default();
        assert_eq!(profile.odds(&at(6, 14)), 0.4);
        assert_eq!(profile.odds(&at(7, 8)), 0.1);
    }

    #[test]
    fn test_odds_are_clamped() {
        let profile = WorkingHoursProfile {
            weekday: vec![HourBand::new(0, 23, 3.0)],
            weekend: vec![HourBand::new(0, 23, -1.0)],
            off_hours: 0.0,
        };
        assert_eq!(profile.odds(&at(1, 12)), 1.0);
        assert_eq!(profile.odds(&at(6, 12)), 0.0);
    }

    #[test]
    fn test_profile_deserialize_partial() {
        let profile: WorkingHoursProfile = serde_json::from_str(r#"{"offHours": 0.05}"#).unwrap();
        assert_eq!(profile.off_hours, 0.05);
        assert_eq!(profile.weekday, WorkingHoursProfile::default().weekday);
    }
}
