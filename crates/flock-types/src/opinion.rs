//! Opinion State
//!
//! The binary classification carried by every agent and source.

use serde::{Deserialize, Serialize};

/// Opinion held by an agent or broadcast by a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Opinion {
    /// Fast, cohesive flocking with like-minded neighbours
    Radical,
    /// Calm, slow, independent movement
    #[default]
    Neutral,
}

impl Opinion {
    /// Numeric value used for polarization: +1 for Radical, -1 for Neutral.
    pub fn value(self) -> f32 {
        match self {
            Opinion::Radical => 1.0,
            Opinion::Neutral => -1.0,
        }
    }

    pub fn is_radical(self) -> bool {
        self == Opinion::Radical
    }
}
