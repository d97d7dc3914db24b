//! Motion Systems
//!
//! Position integration and boundary reflection for both populations.

use bevy_ecs::prelude::*;

use crate::components::{Agents, FrameDelta, Region, Sources};

/// Constants for source animation
pub mod motion_constants {
    /// Phase advance per tick, independent of the frame delta
    pub const PHASE_STEP: f32 = 0.02;
}

use motion_constants::PHASE_STEP;

/// Reflect-and-clamp on one axis.
///
/// Any out-of-range position inverts the velocity component, even if it was
/// already heading back inside, and is then clamped onto `[0, max]`.
#[inline]
pub fn reflect_and_clamp(position: &mut f32, velocity: &mut f32, max: f32) {
    if *position < 0.0 || *position > max {
        *velocity = -*velocity;
    }
    *position = position.clamp(0.0, max);
}

/// System: move sources, advance their phase and keep them in bounds
pub fn advance_sources(mut sources: ResMut<Sources>, region: Res<Region>, dt: Res<FrameDelta>) {
    for source in sources.0.iter_mut() {
        source.x += source.vx * dt.0;
        source.y += source.vy * dt.0;
        source.phase += PHASE_STEP;

        reflect_and_clamp(&mut source.x, &mut source.vx, region.width);
        reflect_and_clamp(&mut source.y, &mut source.vy, region.height);
    }
}

/// System: move agents by their (already steered) velocity and keep them in bounds
pub fn integrate_agents(mut agents: ResMut<Agents>, region: Res<Region>, dt: Res<FrameDelta>) {
    for agent in agents.0.iter_mut() {
        agent.x += agent.vx * dt.0;
        agent.y += agent.vy * dt.0;

        reflect_and_clamp(&mut agent.x, &mut agent.vx, region.width);
        reflect_and_clamp(&mut agent.y, &mut agent.vy, region.height);
    }
}
