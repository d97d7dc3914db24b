//! Population Spawning
//!
//! Places sources and agents uniformly over the region with randomized
//! velocities and opinions.

use rand::Rng;
use std::f32::consts::TAU;
use std::fmt;

use crate::components::{Agent, Source};
use crate::config::SimConfig;
use flock_types::Opinion;

/// Constants for initial velocities
pub mod spawn_constants {
    /// Sources start with each velocity component in `[-SPREAD/2, SPREAD/2)`
    pub const SOURCE_VELOCITY_SPREAD: f32 = 0.5;
    pub const AGENT_VELOCITY_SPREAD: f32 = 2.0;
}

use spawn_constants::{AGENT_VELOCITY_SPREAD, SOURCE_VELOCITY_SPREAD};

fn spread(rng: &mut impl Rng, width: f32) -> f32 {
    (rng.gen::<f32>() - 0.5) * width
}

fn random_opinion(rng: &mut impl Rng) -> Opinion {
    if rng.gen_bool(0.5) {
        Opinion::Radical
    } else {
        Opinion::Neutral
    }
}

/// Spawn `config.source_count` sources with a fair coin per opinion
pub fn spawn_sources(config: &SimConfig, rng: &mut impl Rng) -> Vec<Source> {
    (0..config.source_count)
        .map(|_| {
            let x = rng.gen::<f32>() * config.region_width;
            let y = rng.gen::<f32>() * config.region_height;
            let vx = spread(rng, SOURCE_VELOCITY_SPREAD);
            let vy = spread(rng, SOURCE_VELOCITY_SPREAD);
            let opinion = random_opinion(rng);
            let phase = rng.gen::<f32>() * TAU;

            Source::new(x, y, opinion, config.source_radius)
                .with_velocity(vx, vy)
                .with_phase(phase)
        })
        .collect()
}

/// Spawn `config.agent_count` neutral agents
pub fn spawn_agents(config: &SimConfig, rng: &mut impl Rng) -> Vec<Agent> {
    (0..config.agent_count)
        .map(|_| {
            let x = rng.gen::<f32>() * config.region_width;
            let y = rng.gen::<f32>() * config.region_height;
            let vx = spread(rng, AGENT_VELOCITY_SPREAD);
            let vy = spread(rng, AGENT_VELOCITY_SPREAD);
            Agent::new(x, y).with_velocity(vx, vy)
        })
        .collect()
}

/// Spawn both populations; sources draw from the stream first.
pub fn spawn_population(config: &SimConfig, rng: &mut impl Rng) -> (Vec<Agent>, Vec<Source>) {
    let sources = spawn_sources(config, rng);
    let agents = spawn_agents(config, rng);
    (agents, sources)
}

/// Summary of a spawned population
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnSummary {
    pub agents: usize,
    pub sources: usize,
    pub radical_sources: usize,
}

impl SpawnSummary {
    pub fn of(agents: &[Agent], sources: &[Source]) -> Self {
        Self {
            agents: agents.len(),
            sources: sources.len(),
            radical_sources: sources.iter().filter(|s| s.opinion().is_radical()).count(),
        }
    }
}

impl fmt::Display for SpawnSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} agents, {} sources ({} radical, {} neutral)",
            self.agents,
            self.sources,
            self.radical_sources,
            self.sources - self.radical_sources
        )
    }
}
