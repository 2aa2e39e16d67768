//! Temporal word-frequency engine.
//!
//! Ingests (date, word, count) rows per category, validates the covered
//! calendar span, aggregates per-day statistics once, and drives them with
//! a bidirectional variable-speed playback clock.
//!
//! Zero file I/O: callers hand in text and receive statistics and events.

pub mod cache;
pub mod calendar;
pub mod category;
pub mod clock;
pub mod constants;
pub mod csv;
pub mod dates;
pub mod engine;
pub mod error;
pub mod events;
pub mod story;
pub mod store;
pub mod view;

pub use cache::{AggregationCache, CategorySummary, WordStats};
pub use calendar::Calendar;
pub use category::Category;
pub use clock::{ClockConfig, ClockState, PlaybackClock, Speed};
pub use constants::{DEFAULT_SECONDS_PER_DAY, MAX_SPAN_DAYS};
pub use csv::{CsvTable, split_fields};
pub use dates::DateLocale;
pub use engine::Engine;
pub use error::{EngineError, Result, SpanViolation};
pub use events::{ChannelObserver, ClockEvent, ClockObserver, EventBus, FnObserver, ListenerId};
pub use story::{StoryPoint, StoryPointIndex, StoryRowError, StoryTransition};
pub use store::{IngestReport, RecordStore, RowError, WordSeries};
pub use view::{PlaybackView, SpeedSmoother};
