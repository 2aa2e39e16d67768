//! Bidirectional, variable-speed day clock.
//!
//! The clock starts on day 1, unpaused, moving forward at normal speed.
//! Each unpaused tick accumulates `delta * modifier` seconds; every full
//! `seconds_per_day` in the direction of travel moves the day index one
//! step. Overshoot is carried into the next day so playback speed does not
//! depend on frame rate.
//!
//! Reaching the last day moving forward, or the first day moving backward
//! once the accumulator has unwound through zero, pauses the clock and
//! reverses its direction. Resuming then plays the other way, so the
//! timeline is a closed loop with no terminal state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::Calendar;
use crate::constants::{DEFAULT_SECONDS_PER_DAY, MAX_SECONDS_PER_DAY, MIN_SECONDS_PER_DAY};
use crate::events::{ClockEvent, ClockObserver, EventBus, ListenerId};

/// Signed playback rate. There is no stopped rung; pausing is separate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speed {
    FastReverse,
    Reverse,
    Forward,
    FastForward,
}

impl Speed {
    /// Rungs from slowest (fast reverse) to fastest.
    pub const LADDER: [Speed; 4] = [
        Speed::FastReverse,
        Speed::Reverse,
        Speed::Forward,
        Speed::FastForward,
    ];

    pub fn modifier(self) -> i8 {
        match self {
            Speed::FastReverse => -2,
            Speed::Reverse => -1,
            Speed::Forward => 1,
            Speed::FastForward => 2,
        }
    }

    pub fn is_forward(self) -> bool {
        self.modifier() > 0
    }

    fn rung(self) -> usize {
        match self {
            Speed::FastReverse => 0,
            Speed::Reverse => 1,
            Speed::Forward => 2,
            Speed::FastForward => 3,
        }
    }

    /// One rung up, clamped at [`Speed::FastForward`].
    pub fn faster(self) -> Self {
        Self::LADDER[(self.rung() + 1).min(Self::LADDER.len() - 1)]
    }

    /// One rung down, clamped at [`Speed::FastReverse`].
    pub fn slower(self) -> Self {
        Self::LADDER[self.rung().saturating_sub(1)]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Wall-clock seconds per simulated day at normal speed.
    pub seconds_per_day: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            seconds_per_day: DEFAULT_SECONDS_PER_DAY,
        }
    }
}

impl ClockConfig {
    pub fn new(seconds_per_day: f32) -> Self {
        Self { seconds_per_day }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if !(MIN_SECONDS_PER_DAY..=MAX_SECONDS_PER_DAY).contains(&self.seconds_per_day) {
            return Err("seconds_per_day must be in [0.1, 20]");
        }
        Ok(())
    }
}

/// Read-only view of the clock for reporting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ClockState {
    pub day: u32,
    pub date: NaiveDate,
    pub lookahead: NaiveDate,
    pub progress: f32,
    pub speed: Speed,
    pub paused: bool,
}

pub struct PlaybackClock {
    calendar: Calendar,
    seconds_per_day: f32,
    current_day: u32,
    /// Seconds accumulated toward the next day. Negative while moving
    /// backward.
    timer: f32,
    speed: Speed,
    paused: bool,
    bus: EventBus,
}

impl PlaybackClock {
    /// A seconds-per-day outside the accepted range is clamped into it.
    pub fn new(calendar: Calendar, config: ClockConfig) -> Self {
        if let Err(e) = config.validate() {
            tracing::warn!("{e}, got {}; clamping", config.seconds_per_day);
        }
        let seconds_per_day = if config.seconds_per_day.is_nan() {
            DEFAULT_SECONDS_PER_DAY
        } else {
            config
                .seconds_per_day
                .clamp(MIN_SECONDS_PER_DAY, MAX_SECONDS_PER_DAY)
        };

        Self {
            calendar,
            seconds_per_day,
            current_day: 1,
            timer: 0.0,
            speed: Speed::Forward,
            paused: false,
            bus: EventBus::new(),
        }
    }

    // --- Listeners ---

    pub fn subscribe(&mut self, observer: impl ClockObserver + 'static) -> ListenerId {
        self.bus.subscribe(observer)
    }

    pub fn subscribe_fn(&mut self, f: impl FnMut(&ClockEvent) + 'static) -> ListenerId {
        self.bus.subscribe_fn(f)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    // --- State ---

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn seconds_per_day(&self) -> f32 {
        self.seconds_per_day
    }

    pub fn current_day(&self) -> u32 {
        self.current_day
    }

    pub fn current_date(&self) -> NaiveDate {
        self.calendar.date_for_day(self.current_day as i64)
    }

    /// Next date in the direction of travel, or the current date when the
    /// timeline has no further day that way.
    pub fn lookahead_date(&self) -> NaiveDate {
        let step: i64 = if self.speed.is_forward() { 1 } else { -1 };
        let next = (self.current_day as i64 + step).clamp(1, self.calendar.total_days() as i64);
        self.calendar.date_for_day(next)
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Zero while paused, otherwise the speed modifier.
    pub fn effective_speed(&self) -> f32 {
        if self.paused {
            0.0
        } else {
            f32::from(self.speed.modifier())
        }
    }

    /// Fraction of the way from the current day to the lookahead day.
    pub fn progress(&self) -> f32 {
        (self.timer.abs() / self.seconds_per_day).min(1.0 - f32::EPSILON)
    }

    pub fn state(&self) -> ClockState {
        ClockState {
            day: self.current_day,
            date: self.current_date(),
            lookahead: self.lookahead_date(),
            progress: self.progress(),
            speed: self.speed,
            paused: self.paused,
        }
    }

    // --- Transitions ---

    /// Announce the full current state, for listeners that subscribed
    /// after construction.
    pub fn broadcast_state(&mut self) {
        let current = self.current_date();
        let lookahead = self.lookahead_date();
        self.bus.emit(ClockEvent::DateChanged { current, lookahead });
        self.bus.emit(ClockEvent::SpeedChanged {
            effective_speed: self.effective_speed(),
        });
        self.emit_time_parameter();
    }

    /// Advance by `delta_seconds` of wall-clock time.
    ///
    /// A tick larger than one day crosses several days and emits one
    /// `DateChanged` per crossing. `TimeAdvance` is emitted on every tick,
    /// paused or not.
    pub fn tick(&mut self, delta_seconds: f32) {
        if !self.paused {
            self.timer += delta_seconds * f32::from(self.speed.modifier());
            self.advance_days();
        }
        self.bus.emit(ClockEvent::TimeAdvance {
            progress: self.progress(),
        });
    }

    fn advance_days(&mut self) {
        let spd = self.seconds_per_day;

        while !self.paused {
            let forward = self.speed.is_forward();

            if forward {
                if self.timer < spd {
                    break;
                }
            } else if self.current_day <= 1 {
                // nothing earlier to step into: stop once unwound through zero
                if self.timer > 0.0 {
                    break;
                }
                if self.check_end_of_timeline() {
                    self.emit_position(true);
                }
                break;
            } else if self.timer > -spd {
                break;
            }

            let step: i64 = if forward { 1 } else { -1 };
            self.current_day = (self.current_day as i64 + step)
                .clamp(1, self.calendar.total_days() as i64) as u32;

            // the end check reads the accumulator before it is rewound
            let end = self.check_end_of_timeline();
            if !end {
                self.timer += if forward { -spd } else { spd };
            }
            self.emit_position(end);
        }
    }

    /// Step the speed one rung. Always unpauses first.
    pub fn set_speed(&mut self, faster: bool) {
        self.set_paused(false);

        self.speed = if faster {
            self.speed.faster()
        } else {
            self.speed.slower()
        };

        if !self.check_end_of_timeline() {
            self.bus.emit(ClockEvent::SpeedChanged {
                effective_speed: self.effective_speed(),
            });
            self.emit_time_parameter();
        }
    }

    /// Pausing never changes the day. `SpeedChanged` is always emitted;
    /// `TimeParameterChanged` only when the paused flag actually flips.
    pub fn set_paused(&mut self, paused: bool) {
        let changed = self.paused != paused;
        self.paused = paused;

        self.bus.emit(ClockEvent::SpeedChanged {
            effective_speed: self.effective_speed(),
        });
        if changed {
            self.emit_time_parameter();
        }
    }

    pub fn toggle_pause(&mut self) {
        self.set_paused(!self.paused);
    }

    /// Jump back to day 1 with an empty accumulator.
    pub fn reset(&mut self) {
        self.current_day = 1;
        self.timer = 0.0;
        let end = self.check_end_of_timeline();
        self.emit_position(end);
    }

    /// Auto-pause and reverse if the clock sits at the end it is moving
    /// toward. Moving backward, day 1 only counts once the accumulator is
    /// back at or below zero.
    fn check_end_of_timeline(&mut self) -> bool {
        let forward = self.speed.is_forward();
        let at_end = if forward {
            self.current_day >= self.calendar.total_days()
        } else {
            self.current_day <= 1 && self.timer <= 0.0
        };

        if !at_end {
            return false;
        }

        self.set_paused(true);
        self.speed = if forward { Speed::Reverse } else { Speed::Forward };
        self.timer = 0.0;

        tracing::debug!(
            "end of timeline at {}, reversing",
            self.calendar.label(self.current_day)
        );
        self.bus.emit(ClockEvent::TimelineEnd {
            reached_last_day: forward,
        });
        true
    }

    fn emit_position(&mut self, at_end: bool) {
        let current = self.current_date();
        let lookahead = if at_end {
            current
        } else {
            self.lookahead_date()
        };
        self.emit_time_parameter();
        self.bus.emit(ClockEvent::DateChanged { current, lookahead });
    }

    fn emit_time_parameter(&mut self) {
        self.bus.emit(ClockEvent::TimeParameterChanged {
            current: self.current_date(),
            moving_forward: self.speed.is_forward(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 7, day).unwrap()
    }

    fn clock(days: u32) -> PlaybackClock {
        let calendar = Calendar::build(d(1), d(days)).unwrap();
        PlaybackClock::new(calendar, ClockConfig::default())
    }

    fn recorded(clock: &mut PlaybackClock) -> Rc<RefCell<Vec<ClockEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        clock.subscribe_fn(move |e| sink.borrow_mut().push(e.clone()));
        log
    }

    fn date_changes(log: &[ClockEvent]) -> Vec<(NaiveDate, NaiveDate)> {
        log.iter()
            .filter_map(|e| match e {
                ClockEvent::DateChanged { current, lookahead } => Some((*current, *lookahead)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_initial_state() {
        let c = clock(5);
        assert_eq!(c.current_day(), 1);
        assert_eq!(c.speed(), Speed::Forward);
        assert!(!c.is_paused());
        assert_eq!(c.lookahead_date(), d(2));
    }

    #[test]
    fn test_ladder_clamps_up() {
        let mut c = clock(30);
        c.set_speed(true);
        assert_eq!(c.speed().modifier(), 2);
        c.set_speed(true);
        assert_eq!(c.speed().modifier(), 2);
    }

    #[test]
    fn test_ladder_clamps_down_without_zero_rung() {
        let mut c = clock(30);
        c.tick(3.0);
        c.set_speed(false);
        assert_eq!(c.speed().modifier(), -1);
        c.set_speed(false);
        assert_eq!(c.speed().modifier(), -2);
        c.set_speed(false);
        assert_eq!(c.speed().modifier(), -2);
    }

    #[test]
    fn test_set_speed_unpauses() {
        let mut c = clock(30);
        c.tick(2.0);
        c.set_paused(true);
        c.set_speed(true);
        assert!(!c.is_paused());
        assert_eq!(c.effective_speed(), 2.0);
    }

    #[test]
    fn test_overshoot_carries_into_next_day() {
        let mut c = clock(10);
        c.tick(1.5);
        assert_eq!(c.current_day(), 2);
        assert_relative_eq!(c.progress(), 0.5);

        c.set_speed(true);
        c.tick(0.25);
        assert_eq!(c.current_day(), 3);
        assert_relative_eq!(c.progress(), 0.0);
    }

    #[test]
    fn test_long_tick_crosses_several_days() {
        let mut c = clock(10);
        let log = recorded(&mut c);
        c.tick(3.5);
        assert_eq!(c.current_day(), 4);
        assert_relative_eq!(c.progress(), 0.5);
        assert_eq!(
            date_changes(&log.borrow()),
            vec![(d(2), d(3)), (d(3), d(4)), (d(4), d(5))]
        );
    }

    #[test]
    fn test_forward_end_pauses_and_reverses() {
        let mut c = clock(5);
        let log = recorded(&mut c);
        for _ in 0..16 {
            c.tick(0.25);
        }
        assert_eq!(c.current_day(), 5);
        assert!(c.is_paused());
        assert_eq!(c.speed().modifier(), -1);
        assert_relative_eq!(c.progress(), 0.0);

        let log = log.borrow();
        assert_eq!(date_changes(&log).last(), Some(&(d(5), d(5))));
        assert!(log.contains(&ClockEvent::TimelineEnd { reached_last_day: true }));
        assert!(log.contains(&ClockEvent::SpeedChanged { effective_speed: 0.0 }));
    }

    #[test]
    fn test_fast_forward_end_reverses_at_normal_speed() {
        let mut c = clock(3);
        c.set_speed(true);
        c.tick(1.0);
        assert!(c.is_paused());
        assert_eq!(c.speed(), Speed::Reverse);
    }

    #[test]
    fn test_resume_after_end_moves_backward() {
        let mut c = clock(5);
        c.tick(4.0);
        assert!(c.is_paused());

        c.toggle_pause();
        c.tick(1.0);
        assert_eq!(c.current_day(), 4);
        assert_eq!(c.lookahead_date(), d(3));
        c.tick(1.0);
        assert_eq!(c.current_day(), 3);
    }

    #[test]
    fn test_backward_end_at_first_day() {
        let mut c = clock(5);
        c.tick(4.0);
        c.toggle_pause();
        let log = recorded(&mut c);
        c.tick(4.0);

        assert_eq!(c.current_day(), 1);
        assert!(c.is_paused());
        assert_eq!(c.speed(), Speed::Forward);
        assert!(
            log.borrow()
                .contains(&ClockEvent::TimelineEnd { reached_last_day: false })
        );
        assert_eq!(date_changes(&log.borrow()).last(), Some(&(d(1), d(1))));
    }

    #[test]
    fn test_reverse_on_first_day_waits_for_unwind() {
        let mut c = clock(5);
        c.tick(0.5);
        c.set_speed(false);
        assert!(!c.is_paused(), "accumulator is still positive");

        c.tick(0.25);
        assert!(!c.is_paused());
        assert_relative_eq!(c.progress(), 0.25);

        c.tick(0.5);
        assert!(c.is_paused());
        assert_eq!(c.current_day(), 1);
        assert_eq!(c.speed(), Speed::Forward);
    }

    #[test]
    fn test_reverse_requested_on_first_day_with_empty_timer() {
        let mut c = clock(5);
        c.set_speed(false);
        assert!(c.is_paused());
        assert_eq!(c.speed(), Speed::Forward);
    }

    #[test]
    fn test_speeding_up_at_last_day_reverses_again() {
        let mut c = clock(5);
        c.tick(4.0);
        c.set_speed(true);
        assert!(c.is_paused());
        assert_eq!(c.speed(), Speed::Reverse);
        assert_eq!(c.current_day(), 5);
    }

    #[test]
    fn test_paused_tick_only_reports_progress() {
        let mut c = clock(5);
        c.tick(0.5);
        c.set_paused(true);
        let log = recorded(&mut c);
        c.tick(10.0);
        assert_eq!(c.current_day(), 1);
        assert_eq!(*log.borrow(), vec![ClockEvent::TimeAdvance { progress: 0.5 }]);
    }

    #[test]
    fn test_pause_events() {
        let mut c = clock(5);
        let log = recorded(&mut c);
        c.set_paused(true);
        c.set_paused(true);
        let log = log.borrow();
        assert_eq!(
            *log,
            vec![
                ClockEvent::SpeedChanged { effective_speed: 0.0 },
                ClockEvent::TimeParameterChanged { current: d(1), moving_forward: true },
                ClockEvent::SpeedChanged { effective_speed: 0.0 },
            ]
        );
    }

    #[test]
    fn test_reset_returns_to_first_day() {
        let mut c = clock(10);
        c.tick(3.5);
        c.reset();
        assert_eq!(c.current_day(), 1);
        assert_relative_eq!(c.progress(), 0.0);
        assert!(!c.is_paused());
    }

    #[test]
    fn test_broadcast_state() {
        let mut c = clock(10);
        c.tick(2.0);
        let log = recorded(&mut c);
        c.broadcast_state();
        assert_eq!(
            *log.borrow(),
            vec![
                ClockEvent::DateChanged { current: d(3), lookahead: d(4) },
                ClockEvent::SpeedChanged { effective_speed: 1.0 },
                ClockEvent::TimeParameterChanged { current: d(3), moving_forward: true },
            ]
        );
    }

    #[test]
    fn test_seconds_per_day_scales_playback() {
        let calendar = Calendar::build(d(1), d(10)).unwrap();
        let mut c = PlaybackClock::new(calendar, ClockConfig::new(2.0));
        c.tick(1.0);
        assert_eq!(c.current_day(), 1);
        assert_relative_eq!(c.progress(), 0.5);
        c.tick(1.0);
        assert_eq!(c.current_day(), 2);
    }

    #[test]
    fn test_out_of_range_config_is_clamped() {
        let calendar = Calendar::build(d(1), d(10)).unwrap();
        let c = PlaybackClock::new(calendar, ClockConfig::new(0.0));
        assert_relative_eq!(c.seconds_per_day(), MIN_SECONDS_PER_DAY);
        assert!(ClockConfig::new(0.0).validate().is_err());
        assert!(ClockConfig::default().validate().is_ok());
    }
}
