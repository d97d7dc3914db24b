//! World Components
//!
//! Region bounds, frame timing and per-tick counters.

use bevy_ecs::prelude::*;

/// Resource: the bounded plane every entity lives on
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub width: f32,
    pub height: f32,
}

impl Region {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Check a point against the closed bounds `[0, width] x [0, height]`
    pub fn contains(&self, x: f32, y: f32) -> bool {
        (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
    }
}

/// Resource: effective time step for the current tick (frame delta x speed multiplier)
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct FrameDelta(pub f32);

impl Default for FrameDelta {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Resource: host clock readings driving the frame delta
#[derive(Resource, Debug, Clone, Default)]
pub struct HostClock {
    now_ms: f64,
    previous_ms: Option<f64>,
}

impl HostClock {
    /// Nominal frame length; one frame of elapsed time is a delta of 1.0
    pub const FRAME_MS: f64 = 16.67;

    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reading and return the elapsed time in frames.
    ///
    /// The first reading after a restart counts as exactly one frame; a clock
    /// that runs backwards yields zero.
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        let frames = match self.previous_ms {
            Some(previous) => ((now_ms - previous) / Self::FRAME_MS).max(0.0),
            None => 1.0,
        };
        self.previous_ms = Some(now_ms);
        self.now_ms = now_ms;
        frames as f32
    }

    /// Forget the previous reading, e.g. after a pause
    pub fn restart(&mut self) {
        self.previous_ms = None;
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }
}

/// Resource: tick bookkeeping, counters reset at the start of every tick
#[derive(Resource, Debug, Clone, Default)]
pub struct TickState {
    /// Ticks completed in the current epoch
    pub current_tick: u64,
    /// Distance evaluations reported by the influence resolver this tick
    pub distance_checks: u64,
}

impl TickState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new tick: clear counters
    pub fn begin_tick(&mut self) {
        self.distance_checks = 0;
    }

    /// Mark the current tick as completed
    pub fn finish_tick(&mut self) {
        self.current_tick += 1;
    }
}

/// System: reset per-tick counters before anything else runs
pub fn begin_tick(mut tick_state: ResMut<TickState>) {
    tick_state.begin_tick();
}
