//! Flocking System
//!
//! Opinion-dependent steering. Every agent gets velocity jitter and separation
//! from crowding neighbours; radical agents also align with and close in on
//! nearby radical agents and cruise faster. Neutral agents ignore their peers
//! apart from separation and drift slowly.
//!
//! Agents are updated in index order and in place, so an agent can see the
//! already-updated velocity of a lower-indexed neighbour within the same tick.
//! Positions do not change until integration.

use bevy_ecs::prelude::*;
use rand::Rng;

use crate::components::{Agent, Agents};
use crate::config::FlockingConfig;
use crate::spatial::{GridSpec, SpatialGrid};
use crate::SimRng;

/// Resource: grid over agent positions, rebuilt at the start of every flocking pass
#[derive(Resource, Debug, Clone)]
pub struct AgentGrid(pub SpatialGrid);

impl AgentGrid {
    pub fn new(spec: GridSpec) -> Self {
        Self(SpatialGrid::new(spec))
    }
}

/// Accumulated neighbour influence on one agent
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NeighbourForces {
    /// Sum of unit vectors pointing away from close neighbours
    pub separation: (f32, f32),
    /// Sum of radical neighbour velocities
    pub velocity_sum: (f32, f32),
    /// Sum of radical neighbour positions
    pub position_sum: (f32, f32),
    pub radical_count: u32,
}

/// Gather separation, alignment and cohesion inputs for `agents[index]`.
pub fn neighbour_forces(
    agents: &[Agent],
    index: usize,
    grid: &SpatialGrid,
    tuning: &FlockingConfig,
) -> NeighbourForces {
    let agent = &agents[index];
    let mut forces = NeighbourForces::default();

    for other_index in grid.neighborhood(agent.x, agent.y) {
        if other_index == index {
            continue;
        }
        let other = &agents[other_index];
        let dx = other.x - agent.x;
        let dy = other.y - agent.y;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance < tuning.separation_radius && distance > 0.0 {
            forces.separation.0 -= dx / distance;
            forces.separation.1 -= dy / distance;
        }

        // Only radical agents flock, and only with radical neighbours
        if distance < tuning.flock_radius && agent.opinion.is_radical() && other.opinion.is_radical() {
            forces.velocity_sum.0 += other.vx;
            forces.velocity_sum.1 += other.vy;
            forces.position_sum.0 += other.x;
            forces.position_sum.1 += other.y;
            forces.radical_count += 1;
        }
    }

    forces
}

/// Apply jitter, opinion rules and damped speed correction to one agent.
pub fn steer(agent: &mut Agent, forces: &NeighbourForces, tuning: &FlockingConfig, rng: &mut impl Rng) {
    if tuning.jitter > 0.0 {
        agent.vx += rng.gen_range(-tuning.jitter..=tuning.jitter);
        agent.vy += rng.gen_range(-tuning.jitter..=tuning.jitter);
    }

    if agent.opinion.is_radical() {
        agent.vx += forces.separation.0 * tuning.radical_separation_weight;
        agent.vy += forces.separation.1 * tuning.radical_separation_weight;

        if forces.radical_count > 0 {
            let count = forces.radical_count as f32;
            agent.vx += (forces.velocity_sum.0 / count - agent.vx) * tuning.alignment_weight;
            agent.vy += (forces.velocity_sum.1 / count - agent.vy) * tuning.alignment_weight;

            let centre_x = forces.position_sum.0 / count;
            let centre_y = forces.position_sum.1 / count;
            agent.vx += (centre_x - agent.x) * tuning.cohesion_weight;
            agent.vy += (centre_y - agent.y) * tuning.cohesion_weight;
        }

        correct_speed(agent, tuning.radical_speed, tuning);
    } else {
        agent.vx += forces.separation.0 * tuning.neutral_separation_weight;
        agent.vy += forces.separation.1 * tuning.neutral_separation_weight;

        correct_speed(agent, tuning.neutral_speed, tuning);
    }
}

/// Move speed a fixed fraction of the way toward `target_speed`.
///
/// Scales velocity by `factor * k + (1 - k)` with `factor = target / speed`;
/// nearly-stopped agents are left alone.
pub fn correct_speed(agent: &mut Agent, target_speed: f32, tuning: &FlockingConfig) {
    let speed = agent.speed();
    if speed > tuning.min_correctable_speed {
        let factor = target_speed / speed;
        let scale = factor * tuning.speed_correction + (1.0 - tuning.speed_correction);
        agent.vx *= scale;
        agent.vy *= scale;
    }
}

/// Run one flocking pass over `agents` using a grid built from their current positions.
pub fn apply_flocking_forces(
    agents: &mut [Agent],
    grid: &SpatialGrid,
    tuning: &FlockingConfig,
    rng: &mut impl Rng,
) {
    for index in 0..agents.len() {
        let forces = neighbour_forces(agents, index, grid, tuning);
        steer(&mut agents[index], &forces, tuning, rng);
    }
}

/// System: rebuild the agent grid and steer every agent
pub fn apply_flocking(
    mut agents: ResMut<Agents>,
    mut agent_grid: ResMut<AgentGrid>,
    tuning: Res<FlockingConfig>,
    mut rng: ResMut<SimRng>,
) {
    agent_grid.0.rebuild(&agents.0);
    apply_flocking_forces(&mut agents.0, &agent_grid.0, &tuning, &mut rng.0);
}
