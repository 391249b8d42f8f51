// In crates/engine/src/schedule.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Days, NaiveTime, TimeZone};
use std::str::FromStr;

/// A fixed local wall-clock time at which the cycle runs each day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    pub fn time(&self) -> NaiveTime {
        self.at
    }

    /// The first scheduled instant strictly after `now`.
    ///
    /// When the wall-clock time falls into a DST gap, the run moves to the
    /// next day on which it exists.
    pub fn next_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let tz = now.timezone();
        let mut day = now.date_naive();
        loop {
            if let Some(candidate) = tz.from_local_datetime(&day.and_time(self.at)).earliest() {
                if candidate > *now {
                    return candidate;
                }
            }
            day = match day.checked_add_days(Days::new(1)) {
                Some(next) => next,
                None => return now.clone(),
            };
        }
    }
}

impl FromStr for DailySchedule {
    type Err = anyhow::Error;

    /// Parses `HH:MM` in 24-hour notation.
    fn from_str(s: &str) -> Result<Self> {
        let at = NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .with_context(|| format!("invalid schedule time '{s}', expected HH:MM"))?;
        Ok(Self::new(at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn schedule() -> DailySchedule {
        "09:30".parse().unwrap()
    }

    #[test]
    fn parses_hours_and_minutes() {
        assert_eq!(schedule().time(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert!("9.30".parse::<DailySchedule>().is_err());
        assert!("25:00".parse::<DailySchedule>().is_err());
    }

    #[test]
    fn runs_later_today_when_time_is_ahead() {
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap();
        assert_eq!(
            schedule().next_after(&now),
            Utc.with_ymd_and_hms(2024, 3, 4, 9, 30, 0).unwrap()
        );
    }

    #[test]
    fn runs_tomorrow_once_time_has_passed() {
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 9, 30, 0).unwrap();
        assert_eq!(
            schedule().next_after(&at),
            Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap()
        );

        let late = Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap();
        assert_eq!(
            schedule().next_after(&late),
            Utc.with_ymd_and_hms(2025, 1, 1, 9, 30, 0).unwrap()
        );
    }
}
