//! Snapshot Types
//!
//! Serialization structs for the settled post-tick state.
//!
//! A snapshot holds owned copies of every agent and source plus the metrics
//! of the tick that produced it. It is the only view a renderer or metrics
//! consumer ever gets of the engine; entity storage is never exposed mid-tick.

use serde::{Deserialize, Serialize};

use crate::Opinion;

/// Whether the engine advances on `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Running,
    Paused,
}

/// Agent state after a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub opinion: Opinion,
}

/// Source state after a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceSnapshot {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub opinion: Opinion,
    pub radius: f32,
    /// Cosmetic animation phase, only ever advanced
    pub phase: f32,
}

/// Per-tick measurements
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TickMetrics {
    /// Wall-clock duration of influence, flocking and integration
    pub compute_time_ms: f64,
    /// Agent-to-source distance evaluations performed by the resolver
    pub distance_checks: u64,
    /// Standard deviation of opinion values (+1 / -1), in [0, 1]
    pub polarization: f32,
}

/// Ticks completed during one reporting window.
///
/// Only produced when a window closes, so consumers must not expect one per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThroughputSample {
    pub ticks: u32,
    pub window_ms: f64,
}

impl ThroughputSample {
    pub fn ticks_per_second(&self) -> f64 {
        if self.window_ms > 0.0 {
            self.ticks as f64 * 1000.0 / self.window_ms
        } else {
            0.0
        }
    }
}

/// Complete engine output for one `step` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSnapshot {
    /// Incremented on every reset
    pub epoch: u64,
    /// Ticks completed in this epoch
    pub tick: u64,
    pub run_state: RunState,
    pub agents: Vec<AgentSnapshot>,
    pub sources: Vec<SourceSnapshot>,
    pub metrics: TickMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throughput: Option<ThroughputSample>,
}

impl StepSnapshot {
    /// Number of agents currently holding the radical opinion.
    pub fn radical_count(&self) -> usize {
        self.agents.iter().filter(|a| a.opinion.is_radical()).count()
    }

    pub fn neutral_count(&self) -> usize {
        self.agents.len() - self.radical_count()
    }

    /// Serialize to pretty JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serialize to compact JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
