//! ECS Resources
//!
//! Entity populations, region bounds and per-tick bookkeeping.

pub mod agent;
pub mod source;
pub mod world;

pub use agent::*;
pub use source::*;
pub use world::*;
