//! Agent Components
//!
//! The follower population: adopts opinions from nearby sources, then flocks.
//!
//! Agents live in one `Agents` resource rather than as ECS entities. The
//! spatial grid, the resolvers and fault reports all address an agent by its
//! index in that vector, and flocking updates agents in index order, so the
//! index has to stay stable for a whole epoch.

use bevy_ecs::prelude::*;
use flock_types::{AgentSnapshot, Opinion};
use serde::{Deserialize, Serialize};

/// Cruising speed given to freshly spawned agents
pub const DEFAULT_CRUISE_SPEED: f32 = 2.0;

/// A single population member
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub opinion: Opinion,
    /// Speed parameter carried from spawn
    pub cruise_speed: f32,
}

impl Agent {
    /// Create a neutral agent at rest
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            opinion: Opinion::Neutral,
            cruise_speed: DEFAULT_CRUISE_SPEED,
        }
    }

    pub fn with_velocity(mut self, vx: f32, vy: f32) -> Self {
        self.vx = vx;
        self.vy = vy;
        self
    }

    pub fn with_opinion(mut self, opinion: Opinion) -> Self {
        self.opinion = opinion;
        self
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn speed(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.vx.is_finite() && self.vy.is_finite()
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            x: self.x,
            y: self.y,
            vx: self.vx,
            vy: self.vy,
            opinion: self.opinion,
        }
    }
}

/// Resource: the agent population, indexed by position in the vector
#[derive(Resource, Debug, Clone, Default)]
pub struct Agents(pub Vec<Agent>);

impl Agents {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn radical_count(&self) -> usize {
        self.0.iter().filter(|a| a.opinion.is_radical()).count()
    }
}
