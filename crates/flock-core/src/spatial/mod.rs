//! Spatial Indexing
//!
//! Grid bucketing used by the optimized influence resolver and by flocking.

pub mod grid;

pub use grid::{GridSpec, Positioned, SpatialGrid, MAX_GRID_CELLS};
