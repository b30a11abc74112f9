//! Inclusive calendar-day ranges for filtering history.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::event::PlayEvent;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("start date {start} is after end date {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },
    #[error("{days} days before {end} is outside the supported calendar")]
    OutOfRange { end: NaiveDate, days: u32 },
}

/// Days `[start, end]`, both inclusive, compared against UTC dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// The range ending on `end` and starting `days` days earlier.
    ///
    /// Both ends are inclusive, so the range covers `days + 1` calendar days.
    pub fn ending_at(end: NaiveDate, days: u32) -> Result<Self, RangeError> {
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days)))
            .ok_or(RangeError::OutOfRange { end, days })?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, counting both ends.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Returns the events whose timestamp falls in the range.
    ///
    /// Events without a timestamp cannot be placed and are dropped.
    pub fn filter(&self, events: &[PlayEvent]) -> Vec<PlayEvent> {
        events
            .iter()
            .filter(|e| e.timestamp.is_some_and(|ts| self.contains(ts.date_naive())))
            .cloned()
            .collect()
    }
}
