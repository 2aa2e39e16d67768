//! Consumer-side state folded from clock events.
//!
//! Renderers hold one of these per visual element; the clock knows nothing
//! about them. Ratios interpolate between the current and lookahead dates
//! by the latest progress value.

use chrono::{Days, NaiveDate};

use crate::cache::AggregationCache;
use crate::calendar::Calendar;
use crate::category::Category;
use crate::events::ClockEvent;

/// Below this gap the smoother snaps to its target.
const SNAP_DISTANCE: f32 = 0.01;

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn ratio(value: f64, max: f64) -> f32 {
    if max <= 0.0 { 0.0 } else { (value / max) as f32 }
}

#[derive(Clone, Debug)]
pub struct PlaybackView {
    calendar: Calendar,
    current: NaiveDate,
    lookahead: NaiveDate,
    progress: f32,
    effective_speed: f32,
    moving_forward: bool,
}

impl PlaybackView {
    /// Matches a freshly built clock: day 1, moving forward.
    pub fn new(calendar: Calendar) -> Self {
        Self {
            calendar,
            current: calendar.start(),
            lookahead: calendar.date_for_day(2),
            progress: 0.0,
            effective_speed: 1.0,
            moving_forward: true,
        }
    }

    pub fn apply(&mut self, event: &ClockEvent) {
        match *event {
            ClockEvent::DateChanged { current, lookahead } => {
                self.current = current;
                self.lookahead = lookahead;
            }
            ClockEvent::TimeAdvance { progress } => self.progress = progress,
            ClockEvent::SpeedChanged { effective_speed } => self.effective_speed = effective_speed,
            ClockEvent::TimeParameterChanged {
                current,
                moving_forward,
            } => {
                let turned = moving_forward != self.moving_forward;
                self.current = current;
                self.moving_forward = moving_forward;
                if turned && !self.at_end() {
                    self.lookahead = self.neighbour(current, moving_forward);
                }
            }
            ClockEvent::TimelineEnd { .. } => self.progress = 0.0,
        }
    }

    fn neighbour(&self, date: NaiveDate, forward: bool) -> NaiveDate {
        let next = if forward {
            date.checked_add_days(Days::new(1))
        } else {
            date.checked_sub_days(Days::new(1))
        };
        next.filter(|d| self.calendar.contains(*d)).unwrap_or(date)
    }

    pub fn current(&self) -> NaiveDate {
        self.current
    }

    pub fn lookahead(&self) -> NaiveDate {
        self.lookahead
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn effective_speed(&self) -> f32 {
        self.effective_speed
    }

    pub fn moving_forward(&self) -> bool {
        self.moving_forward
    }

    /// The clock reported an end: there is nothing to interpolate toward.
    pub fn at_end(&self) -> bool {
        self.current == self.lookahead
    }

    /// Interpolated `total / max total` for a category, in `[0, 1]`.
    pub fn total_ratio(&self, cache: &AggregationCache, category: Category) -> f32 {
        let max = cache.max_total_word_count(category) as f64;
        let now = ratio(cache.total_word_count(category, self.current) as f64, max);
        let next = ratio(cache.total_word_count(category, self.lookahead) as f64, max);
        lerp(now, next, self.progress)
    }

    /// Interpolated `active words / max active words`, in `[0, 1]`.
    pub fn active_ratio(&self, cache: &AggregationCache, category: Category) -> f32 {
        let max = f64::from(cache.max_active_word_count(category));
        let now = ratio(f64::from(cache.active_word_count(category, self.current)), max);
        let next = ratio(f64::from(cache.active_word_count(category, self.lookahead)), max);
        lerp(now, next, self.progress)
    }

    /// Interpolated `count / max count` for one word, in `[0, 1]`.
    pub fn word_ratio(&self, cache: &AggregationCache, category: Category, word: &str) -> f32 {
        let max = cache.max_word_count(category, word) as f64;
        let series = match cache.store().word_series(category, word) {
            Ok(series) => series,
            Err(e) => panic!("{e}"),
        };
        let now = ratio(series.count_on(self.current) as f64, max);
        let next = ratio(series.count_on(self.lookahead) as f64, max);
        lerp(now, next, self.progress)
    }

    /// Change from the current to the lookahead count, scaled by the word's
    /// largest recorded change and mapped from `[-1, 1]` onto `[0, 1]`.
    pub fn word_change_ratio(&self, cache: &AggregationCache, category: Category, word: &str) -> f32 {
        let max = cache.max_absolute_delta(category, word) as f64;
        let series = match cache.store().word_series(category, word) {
            Ok(series) => series,
            Err(e) => panic!("{e}"),
        };
        let change = series.count_on(self.lookahead) as f64 - series.count_on(self.current) as f64;
        let signed = ratio(change, max).clamp(-1.0, 1.0);
        (signed + 1.0) * 0.5
    }
}

/// Eases a displayed speed toward the latest `SpeedChanged` target.
#[derive(Clone, Copy, Debug)]
pub struct SpeedSmoother {
    current: f32,
    target: f32,
    /// Fraction of the remaining gap covered per second, before easing.
    rate: f32,
}

impl SpeedSmoother {
    pub fn new(rate: f32) -> Self {
        Self {
            current: 1.0,
            target: 1.0,
            rate,
        }
    }

    pub fn apply(&mut self, event: &ClockEvent) {
        if let ClockEvent::SpeedChanged { effective_speed } = *event {
            self.target = effective_speed;
        }
    }

    /// Advance the easing by one frame and return the displayed speed.
    pub fn update(&mut self, delta_seconds: f32) -> f32 {
        if (self.current - self.target).abs() < SNAP_DISTANCE {
            self.current = self.target;
        } else {
            let t = (self.rate * delta_seconds).clamp(0.0, 1.0);
            let eased = t * t * (3.0 - 2.0 * t);
            self.current = lerp(self.current, self.target, eased);
        }
        self.current
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ClockConfig, PlaybackClock};
    use crate::store::RecordStore;
    use approx::assert_relative_eq;
    use std::sync::mpsc;

    use crate::events::ChannelObserver;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 9, day).unwrap()
    }

    fn cache() -> AggregationCache {
        let mut store = RecordStore::new();
        store.add(Category::Social, "party", d(1), 2);
        store.add(Category::Social, "party", d(2), 10);
        store.add(Category::Social, "home", d(2), 10);
        store.add(Category::Social, "home", d(4), 5);
        let calendar = Calendar::from_store(&store).unwrap();
        AggregationCache::build(store, calendar)
    }

    #[test]
    fn test_view_follows_clock() {
        let cache = cache();
        let mut clock = PlaybackClock::new(*cache.calendar(), ClockConfig::default());
        let (tx, rx) = mpsc::channel();
        clock.subscribe(ChannelObserver::new(tx));
        let mut view = PlaybackView::new(*cache.calendar());

        clock.tick(0.5);
        rx.try_iter().for_each(|e| view.apply(&e));

        assert_eq!(view.current(), d(1));
        assert_eq!(view.lookahead(), d(2));
        // totals: day1 = 2, day2 = 20, max 20
        assert_relative_eq!(view.total_ratio(&cache, Category::Social), 0.55, epsilon = 1e-6);
        // active: day1 = 1, day2 = 2
        assert_relative_eq!(view.active_ratio(&cache, Category::Social), 0.75, epsilon = 1e-6);
        assert_relative_eq!(view.word_ratio(&cache, Category::Social, "party"), 0.6, epsilon = 1e-6);
        // change 2 -> 10 over a max delta of 8
        assert_relative_eq!(view.word_change_ratio(&cache, Category::Social, "party"), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_view_turns_with_direction() {
        let cache = cache();
        let mut clock = PlaybackClock::new(*cache.calendar(), ClockConfig::default());
        let (tx, rx) = mpsc::channel();
        clock.subscribe(ChannelObserver::new(tx));
        let mut view = PlaybackView::new(*cache.calendar());

        clock.tick(2.25);
        clock.set_speed(false);
        rx.try_iter().for_each(|e| view.apply(&e));

        assert_eq!(view.current(), d(3));
        assert!(!view.moving_forward());
        assert_eq!(view.lookahead(), d(2));
    }

    #[test]
    fn test_view_at_end() {
        let cache = cache();
        let mut clock = PlaybackClock::new(*cache.calendar(), ClockConfig::default());
        let (tx, rx) = mpsc::channel();
        clock.subscribe(ChannelObserver::new(tx));
        let mut view = PlaybackView::new(*cache.calendar());

        clock.tick(3.0);
        rx.try_iter().for_each(|e| view.apply(&e));

        assert!(view.at_end());
        assert_eq!(view.current(), d(4));
        assert_eq!(view.effective_speed(), 0.0);
    }

    #[test]
    fn test_smoother_eases_then_snaps() {
        let mut smoother = SpeedSmoother::new(5.0);
        smoother.apply(&ClockEvent::SpeedChanged { effective_speed: 2.0 });
        let first = smoother.update(0.1);
        assert!(first > 1.0 && first < 2.0, "eased value {first}");

        for _ in 0..100 {
            smoother.update(0.1);
        }
        assert_eq!(smoother.current(), 2.0);
    }
}
