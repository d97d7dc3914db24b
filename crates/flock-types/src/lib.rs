//! Shared state types and serialization for the opinion flocking engine.
//!
//! This crate contains pure data structures with no simulation logic.
//! Renderers and control panels consume these without linking the engine.

pub mod opinion;
pub mod snapshot;

pub use opinion::Opinion;

// Re-export snapshot types
pub use snapshot::{
    AgentSnapshot, RunState, SourceSnapshot, StepSnapshot, ThroughputSample, TickMetrics,
};
