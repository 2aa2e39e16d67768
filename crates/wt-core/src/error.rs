use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

use crate::category::Category;

/// Why a calendar span was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanViolation {
    /// Nothing was ingested, so there are no bounds to build from.
    NoDates,
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    /// The span covers one day or fewer.
    TooShort { days: i64 },
    /// The span covers more than [`MAX_SPAN_DAYS`](crate::constants::MAX_SPAN_DAYS).
    TooLong { days: i64 },
}

impl fmt::Display for SpanViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanViolation::NoDates => write!(f, "no dated records were ingested"),
            SpanViolation::EndBeforeStart { start, end } => write!(
                f,
                "end date {} is earlier than start date {}",
                end.format("%d %B %Y"),
                start.format("%d %B %Y")
            ),
            SpanViolation::TooShort { days } => {
                write!(f, "not enough days to play back (number of days: {days})")
            }
            SpanViolation::TooLong { days } => {
                write!(f, "span of {days} days exceeds the supported range")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid calendar span: {0}")]
    InvalidSpan(SpanViolation),

    #[error("word '{word}' not found in category {category}")]
    NotFound { category: Category, word: String },

    #[error("unknown category '{0}'")]
    UnknownCategory(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
