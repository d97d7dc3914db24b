//! Output
//!
//! Metrics derived from the settled state after every tick.

pub mod metrics;

pub use metrics::{
    collect_metrics, polarization, start_compute_timer, stop_compute_timer, ComputeTimer,
    MetricsCollector,
};
