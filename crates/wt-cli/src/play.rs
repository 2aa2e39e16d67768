//! Headless playback: ticks the clock and prints what a renderer would see.

use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use clap::ValueEnum;
use serde::Serialize;
use wt_core::{
    AggregationCache, ChannelObserver, ClockEvent, ClockState, Engine, PlaybackView,
    SpeedSmoother, StoryPoint, StoryPointIndex,
};
use wt_data::LoadedDataset;

/// Gap fraction the displayed speed closes per second.
const SPEED_SMOOTHING_RATE: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SpeedStep {
    Up,
    Down,
}

pub struct PlayOptions {
    pub frames: u32,
    pub dt: f32,
    pub steps: Vec<SpeedStep>,
    pub realtime: bool,
    pub json: bool,
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum StoryLine<'a> {
    StoryStarted { point: &'a StoryPoint },
    StoryEnded { point: &'a StoryPoint },
}

#[derive(Serialize)]
struct FinalLine {
    event: &'static str,
    #[serde(flatten)]
    state: ClockState,
    displayed_speed: f32,
    frames: u32,
}

/// Remembers the last (day, direction) whose story transitions were
/// reported, so repeated `TimeParameterChanged` events on the same position
/// are not reported twice.
#[derive(Default)]
struct StoryCursor {
    last: Option<(Option<u32>, bool)>,
}

impl StoryCursor {
    /// True when the position differs from the last one seen.
    fn advance(&mut self, day: Option<u32>, moving_forward: bool) -> bool {
        let position = Some((day, moving_forward));
        if self.last == position {
            return false;
        }
        self.last = position;
        true
    }
}

struct Printer<'a> {
    cache: &'a AggregationCache,
    story_points: &'a StoryPointIndex,
    view: PlaybackView,
    smoother: SpeedSmoother,
    story_cursor: StoryCursor,
    json: bool,
}

impl<'a> Printer<'a> {
    fn drain(&mut self, rx: &mpsc::Receiver<ClockEvent>) -> Result<()> {
        for event in rx.try_iter() {
            self.view.apply(&event);
            self.smoother.apply(&event);
            self.print(&event)?;
        }
        Ok(())
    }

    fn emit(&self, value: &impl Serialize) -> Result<()> {
        let line = serde_json::to_string(value).context("failed to serialize event")?;
        println!("{line}");
        Ok(())
    }

    fn print(&mut self, event: &ClockEvent) -> Result<()> {
        let cache = self.cache;
        let calendar = cache.calendar();
        match *event {
            // per-frame progress is too chatty to print
            ClockEvent::TimeAdvance { .. } => Ok(()),
            ClockEvent::DateChanged { current, .. } => {
                if self.json {
                    return self.emit(event);
                }
                let ratios: Vec<String> = cache
                    .categories()
                    .map(|c| format!("{}={:.2}", c.code(), self.view.total_ratio(cache, c)))
                    .collect();
                let label = calendar
                    .day_for_date(current)
                    .map(|day| calendar.label(day))
                    .unwrap_or_else(|| current.to_string());
                println!("{label}  {}", ratios.join(" "));
                Ok(())
            }
            ClockEvent::SpeedChanged { effective_speed } => {
                if self.json {
                    return self.emit(event);
                }
                println!("speed: {effective_speed}");
                Ok(())
            }
            ClockEvent::TimeParameterChanged {
                current,
                moving_forward,
            } => {
                if self.json {
                    self.emit(event)?;
                }
                if !self
                    .story_cursor
                    .advance(calendar.day_for_date(current), moving_forward)
                {
                    return Ok(());
                }
                for transition in self.story_points.transitions_on(current, moving_forward) {
                    let point = transition.point;
                    if self.json {
                        let line = if transition.activated {
                            StoryLine::StoryStarted { point }
                        } else {
                            StoryLine::StoryEnded { point }
                        };
                        self.emit(&line)?;
                    } else {
                        let verb = if transition.activated { "starts" } else { "ends" };
                        println!(
                            "story {verb}: [{}] {}: {}",
                            point.category.code(),
                            point.word,
                            point.description
                        );
                    }
                }
                Ok(())
            }
            ClockEvent::TimelineEnd { reached_last_day } => {
                if self.json {
                    return self.emit(event);
                }
                let which = if reached_last_day { "last" } else { "first" };
                println!("end of timeline: {which} day reached, reversing");
                Ok(())
            }
        }
    }

    fn finish(&self, state: ClockState, frames: u32) -> Result<()> {
        let line = FinalLine {
            event: "final",
            state,
            displayed_speed: self.smoother.current(),
            frames,
        };
        if self.json {
            return self.emit(&line);
        }
        println!(
            "final: {} paused={} speed={:?} ({frames} frames)",
            self.cache.calendar().label(state.day),
            state.paused,
            state.speed
        );
        Ok(())
    }
}

pub async fn run(dataset: LoadedDataset, options: PlayOptions) -> Result<()> {
    ensure!(
        options.dt.is_finite() && options.dt >= 0.0,
        "--dt must be a non-negative number, got {}",
        options.dt
    );
    ensure!(!options.realtime || options.dt > 0.0, "--realtime needs --dt > 0");

    let Engine {
        cache,
        mut clock,
        story_points,
    } = dataset.engine;

    let (tx, rx) = mpsc::channel();
    clock.subscribe(ChannelObserver::new(tx));

    let mut printer = Printer {
        cache: &cache,
        story_points: &story_points,
        view: PlaybackView::new(*cache.calendar()),
        smoother: SpeedSmoother::new(SPEED_SMOOTHING_RATE),
        story_cursor: StoryCursor::default(),
        json: options.json,
    };

    clock.broadcast_state();
    for step in &options.steps {
        clock.set_speed(*step == SpeedStep::Up);
    }
    printer.drain(&rx)?;

    let mut frames = 0;
    if options.realtime {
        let mut interval = tokio::time::interval(Duration::from_secs_f32(options.dt));
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        while frames < options.frames {
            tokio::select! {
                _ = interval.tick() => {}
                _ = &mut ctrl_c => {
                    tracing::info!("interrupted after {frames} frames");
                    break;
                }
            }
            clock.tick(options.dt);
            printer.smoother.update(options.dt);
            printer.drain(&rx)?;
            frames += 1;
        }
    } else {
        while frames < options.frames {
            clock.tick(options.dt);
            printer.smoother.update(options.dt);
            printer.drain(&rx)?;
            frames += 1;
        }
    }

    printer.finish(clock.state(), frames)
}
