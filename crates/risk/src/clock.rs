// In crates/risk/src/clock.rs

use chrono::NaiveDate;
#[cfg(any(test, feature = "test-util"))]
use std::sync::Mutex;

/// Source of the current calendar day used to key the daily risk state.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The machine's local calendar day.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A clock pinned to a settable day. Used to drive day rollovers in tests.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug)]
pub struct FixedClock(Mutex<NaiveDate>);

#[cfg(any(test, feature = "test-util"))]
impl FixedClock {
    pub fn new(day: NaiveDate) -> Self {
        Self(Mutex::new(day))
    }

    pub fn set(&self, day: NaiveDate) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = day;
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}
