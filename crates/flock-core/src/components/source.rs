//! Source Components
//!
//! Mobile broadcasters of a fixed opinion.
//!
//! Stored as one `Sources` resource for the same reason as agents: the
//! influence grid buckets source indices, and equal-strength ties go to the
//! lowest index.

use bevy_ecs::prelude::*;
use flock_types::{Opinion, SourceSnapshot};
use serde::{Deserialize, Serialize};

/// A source reaches agents up to this multiple of its radius
pub const RANGE_MULTIPLIER: f32 = 3.0;

/// Mobile opinion broadcaster
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Fixed for the lifetime of the source
    opinion: Opinion,
    pub radius: f32,
    pub phase: f32,
}

impl Source {
    pub fn new(x: f32, y: f32, opinion: Opinion, radius: f32) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            opinion,
            radius,
            phase: 0.0,
        }
    }

    pub fn with_velocity(mut self, vx: f32, vy: f32) -> Self {
        self.vx = vx;
        self.vy = vy;
        self
    }

    pub fn with_phase(mut self, phase: f32) -> Self {
        self.phase = phase;
        self
    }

    pub fn opinion(&self) -> Opinion {
        self.opinion
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// Distance below which this source exerts any influence
    pub fn range(&self) -> f32 {
        self.radius * RANGE_MULTIPLIER
    }

    /// Influence strength felt at distance `distance`: `1 - d / range` inside range.
    pub fn strength_at(&self, distance: f32) -> Option<f32> {
        let range = self.range();
        if distance < range {
            Some(1.0 - distance / range)
        } else {
            None
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.vx.is_finite() && self.vy.is_finite()
    }

    pub fn snapshot(&self) -> SourceSnapshot {
        SourceSnapshot {
            x: self.x,
            y: self.y,
            vx: self.vx,
            vy: self.vy,
            opinion: self.opinion,
            radius: self.radius,
            phase: self.phase,
        }
    }
}

/// Resource: the source population
#[derive(Resource, Debug, Clone, Default)]
pub struct Sources(pub Vec<Source>);

impl Sources {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Largest influence range in the population, 0 when empty
    pub fn max_range(&self) -> f32 {
        self.0.iter().map(Source::range).fold(0.0, f32::max)
    }
}
