/// Longest playable span, inclusive of both ends.
pub const MAX_SPAN_DAYS: i64 = 365;

/// Shortest playable span. A single day has nothing to play between.
pub const MIN_SPAN_DAYS: i64 = 2;

/// Default wall-clock seconds spent on one simulated day.
pub const DEFAULT_SECONDS_PER_DAY: f32 = 1.0;

/// Accepted range for `seconds_per_day`.
pub const MIN_SECONDS_PER_DAY: f32 = 0.1;
pub const MAX_SECONDS_PER_DAY: f32 = 20.0;

/// Column layout of a category data file.
pub const DATE_COLUMN: usize = 0;
pub const WORD_COLUMN: usize = 1;
pub const COUNT_COLUMN: usize = 2;

/// Display format for dates in labels and log lines.
pub const DATE_LABEL_FORMAT: &str = "%d %B %Y";
