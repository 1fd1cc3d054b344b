//! Timer-driven playback of a generator onto a view.

use std::future::Future;
use std::time::{Duration, Instant};

use log::{debug, info};
use tokio::time::MissedTickBehavior;

use crate::diff::SceneDiff;
use crate::error::Result;
use crate::generator::{GeneratorState, advance};
use crate::grid::{Cell, Grid};

/// Everything a view needs to redraw after one tick.
pub struct Frame<'a> {
    pub tick: u64,
    pub grid: &'a Grid,
    pub path: &'a [Cell],
    pub diff: &'a SceneDiff,
}

pub trait View {
    fn draw(&mut self, frame: &Frame<'_>);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    Advanced,
    Finished,
}

/// How a `run` ended.
#[derive(Debug)]
pub struct Outcome<V> {
    pub state: GeneratorState,
    pub view: V,
    pub ticks: u64,
    pub cancelled: bool,
}

/// Holds the latest generator snapshot and feeds each new one to a view.
pub struct Animator<V> {
    state: GeneratorState,
    view: V,
    ticks: u64,
}

impl<V: View> Animator<V> {
    /// Draws the initial snapshot straight away.
    pub fn new(state: GeneratorState, mut view: V) -> Self {
        let diff = SceneDiff::full(state.grid(), state.stack());
        view.draw(&Frame {
            tick: 0,
            grid: state.grid(),
            path: state.stack(),
            diff: &diff,
        });
        Self { state, view, ticks: 0 }
    }

    pub fn state(&self) -> &GeneratorState {
        &self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tick(&mut self) -> Result<Tick> {
        if self.state.is_complete() {
            return Ok(Tick::Finished);
        }
        let t = Instant::now();
        let next = advance(&self.state)?;
        let advance_ms = t.elapsed().as_secs_f64() * 1000.0;
        let diff = SceneDiff::between(
            self.state.grid(),
            self.state.stack(),
            next.grid(),
            next.stack(),
        );
        self.state = next;
        self.ticks += 1;
        debug!(
            "tick {}: advance {:.3} ms, {} groups, +{} -{} segments",
            self.ticks,
            advance_ms,
            diff.changed_groups.len(),
            diff.added_segments.len(),
            diff.removed_segments.len()
        );
        self.view.draw(&Frame {
            tick: self.ticks,
            grid: self.state.grid(),
            path: self.state.stack(),
            diff: &diff,
        });
        Ok(Tick::Advanced)
    }

    /// Tick until complete.
    pub fn run_to_end(mut self) -> Result<Outcome<V>> {
        while self.tick()? == Tick::Advanced {}
        Ok(self.finish(false))
    }

    /// Tick every `period` until the maze is complete or `stop` resolves.
    pub async fn run<F>(mut self, period: Duration, stop: F) -> Result<Outcome<V>>
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(stop);

        loop {
            tokio::select! {
                biased;
                _ = &mut stop => {
                    info!("animation cancelled after {} ticks", self.ticks);
                    return Ok(self.finish(true));
                }
                _ = interval.tick() => {
                    if self.tick()? == Tick::Finished {
                        info!("animation finished after {} ticks", self.ticks);
                        return Ok(self.finish(false));
                    }
                }
            }
        }
    }

    fn finish(self, cancelled: bool) -> Outcome<V> {
        Outcome {
            state: self.state,
            view: self.view,
            ticks: self.ticks,
            cancelled,
        }
    }
}
