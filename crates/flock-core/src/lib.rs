//! Opinion Flocking Engine Library
//!
//! Public API for the two-population simulation: opinion sources drifting
//! over a bounded plane, follower agents adopting the opinion of the
//! strongest source in range and flocking with like-minded neighbours.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod components;
pub mod config;
pub mod error;
pub mod output;
pub mod setup;
pub mod simulation;
pub mod spatial;
pub mod systems;

pub use components::*;
pub use config::{default_config_toml, Algorithm, FlockingConfig, SimConfig};
pub use error::{ConfigError, EntityKind, SimError};
pub use simulation::Simulation;

pub use flock_types::{
    AgentSnapshot, Opinion, RunState, SourceSnapshot, StepSnapshot, ThroughputSample, TickMetrics,
};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);
