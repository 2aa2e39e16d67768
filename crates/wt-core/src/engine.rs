use crate::cache::AggregationCache;
use crate::calendar::Calendar;
use crate::clock::{ClockConfig, PlaybackClock};
use crate::error::Result;
use crate::story::StoryPointIndex;
use crate::store::RecordStore;

/// The initialized engine: immutable statistics plus the clock that walks
/// over them.
///
/// Built in one direction only: record store → calendar → cache → clock.
/// If the calendar rejects the span, nothing after it is constructed.
pub struct Engine {
    pub cache: AggregationCache,
    pub clock: PlaybackClock,
    pub story_points: StoryPointIndex,
}

impl Engine {
    pub fn initialise(store: RecordStore, config: ClockConfig) -> Result<Self> {
        let calendar = Calendar::from_store(&store).inspect_err(|e| tracing::error!("{e}"))?;
        tracing::info!(
            "calendar: {} .. {} ({} days)",
            calendar.start(),
            calendar.end(),
            calendar.total_days()
        );

        let cache = AggregationCache::build(store, calendar);
        let clock = PlaybackClock::new(calendar, config);

        Ok(Self {
            cache,
            clock,
            story_points: StoryPointIndex::default(),
        })
    }

    pub fn with_story_points(mut self, story_points: StoryPointIndex) -> Self {
        self.story_points = story_points;
        self
    }
}
