//! ECS Systems
//!
//! Per-tick systems: source motion, influence resolution, flocking and
//! agent integration.

pub mod flocking;
pub mod influence;
pub mod motion;

// Re-export commonly used systems
pub use flocking::{apply_flocking, apply_flocking_forces, AgentGrid, NeighbourForces};
pub use influence::{
    adopt_strongest, compare_resolvers, resolve_influence, resolver_for, ActiveResolver,
    GridResolver, InfluenceResolver, NaiveResolver, ResolverComparison,
};
pub use motion::{advance_sources, integrate_agents, reflect_and_clamp};
