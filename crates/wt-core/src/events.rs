//! Notifications emitted by the playback clock.
//!
//! Listeners are called synchronously, in subscription order, inside the
//! clock operation that produced the event. A listener only ever sees a
//! shared reference to the event, so it cannot reach back into the clock
//! while it is being dispatched.

use std::sync::mpsc;

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClockEvent {
    /// The day index changed. `lookahead` is the next day in the direction
    /// of travel, or `current` itself at either end of the timeline.
    DateChanged {
        current: NaiveDate,
        lookahead: NaiveDate,
    },
    /// Emitted every tick. Interpolation progress from `current` toward
    /// `lookahead`, in `[0, 1)`.
    TimeAdvance { progress: f32 },
    /// Effective playback speed; zero while paused.
    SpeedChanged { effective_speed: f32 },
    /// Direction or position changed in a way listeners may care about
    /// without per-tick churn.
    TimeParameterChanged {
        current: NaiveDate,
        moving_forward: bool,
    },
    /// Playback hit an end and auto-reversed. `reached_last_day` is false
    /// when the first day was reached moving backward.
    TimelineEnd { reached_last_day: bool },
}

/// Receives clock events.
pub trait ClockObserver {
    fn on_event(&mut self, event: &ClockEvent);
}

/// Closure-based observer for simple cases.
pub struct FnObserver<F: FnMut(&ClockEvent)>(pub F);

impl<F: FnMut(&ClockEvent)> ClockObserver for FnObserver<F> {
    fn on_event(&mut self, event: &ClockEvent) {
        (self.0)(event);
    }
}

/// Forwards every event into a channel.
pub struct ChannelObserver {
    sender: mpsc::Sender<ClockEvent>,
}

impl ChannelObserver {
    pub fn new(sender: mpsc::Sender<ClockEvent>) -> Self {
        Self { sender }
    }
}

impl ClockObserver for ChannelObserver {
    fn on_event(&mut self, event: &ClockEvent) {
        // a dropped receiver just means nobody is listening anymore
        let _ = self.sender.send(event.clone());
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Ordered listener registry.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, Box<dyn ClockObserver>)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl ClockObserver + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(observer)));
        id
    }

    pub fn subscribe_fn(&mut self, f: impl FnMut(&ClockEvent) + 'static) -> ListenerId {
        self.subscribe(FnObserver(f))
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn emit(&mut self, event: ClockEvent) {
        for (_, listener) in &mut self.listeners {
            listener.on_event(&event);
        }
    }
}
