use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::constants::{DATE_LABEL_FORMAT, MAX_SPAN_DAYS, MIN_SPAN_DAYS};
use crate::error::{EngineError, Result, SpanViolation};
use crate::store::RecordStore;

/// Bijection between 1-based day indices and the dates of a validated span.
///
/// Day 1 is the start date, day `N` is the end date.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Calendar {
    start: NaiveDate,
    end: NaiveDate,
    total_days: u32,
}

impl Calendar {
    /// Validate a span and build the calendar over it.
    ///
    /// Both dates are whole days, so the span length is exact integer
    /// arithmetic. Fails when the end precedes the start, or the span is
    /// one day or fewer, or longer than [`MAX_SPAN_DAYS`].
    pub fn build(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(EngineError::InvalidSpan(SpanViolation::EndBeforeStart { start, end }));
        }

        // + 1 to include the start date
        let days = (end - start).num_days() + 1;

        if days < MIN_SPAN_DAYS {
            return Err(EngineError::InvalidSpan(SpanViolation::TooShort { days }));
        }
        if days > MAX_SPAN_DAYS {
            return Err(EngineError::InvalidSpan(SpanViolation::TooLong { days }));
        }

        Ok(Self {
            start,
            end,
            total_days: days as u32,
        })
    }

    /// Build over the earliest and latest dates the store has seen.
    pub fn from_store(store: &RecordStore) -> Result<Self> {
        let (start, end) = store
            .date_bounds()
            .ok_or(EngineError::InvalidSpan(SpanViolation::NoDates))?;
        Self::build(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn total_days(&self) -> u32 {
        self.total_days
    }

    /// Date of a day index.
    ///
    /// Only days in `[1, N]` are meaningful. Indices outside the span
    /// extrapolate linearly from the start date.
    ///
    /// # Panics
    /// If the extrapolated date leaves chrono's representable range.
    pub fn date_for_day(&self, day: i64) -> NaiveDate {
        let offset = day - 1;
        let date = if offset >= 0 {
            self.start.checked_add_days(Days::new(offset as u64))
        } else {
            self.start.checked_sub_days(Days::new(offset.unsigned_abs()))
        };
        match date {
            Some(date) => date,
            None => panic!("day index {day} is outside the representable date range"),
        }
    }

    /// Day index of a date, or `None` outside the span.
    pub fn day_for_date(&self, date: NaiveDate) -> Option<u32> {
        if date < self.start || date > self.end {
            return None;
        }
        Some((date - self.start).num_days() as u32 + 1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.day_for_date(date).is_some()
    }

    /// Every (day index, date) pair in order.
    pub fn days(&self) -> impl Iterator<Item = (u32, NaiveDate)> + '_ {
        (1..=self.total_days).map(|day| (day, self.date_for_day(day as i64)))
    }

    /// Display label for a day, e.g. `Day 3: 03 July 2020`.
    pub fn label(&self, day: u32) -> String {
        format!(
            "Day {day}: {}",
            self.date_for_day(day as i64).format(DATE_LABEL_FORMAT)
        )
    }
}
