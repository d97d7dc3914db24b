//! Error Types
//!
//! Configuration errors are raised synchronously at initialization. Engine errors
//! surface invariant violations detected while stepping.

use std::fmt;

use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading a config file
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// Error parsing TOML config
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    /// Error serializing config back to TOML
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// A count, dimension or rate that must be strictly positive
    #[error("`{field}` must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    /// A tuning value that must be zero or greater
    #[error("`{field}` must be non-negative and finite, got {value}")]
    Negative { field: &'static str, value: f64 },
    /// Algorithm tag other than `naive` or `optimized`
    #[error("unknown value `{0}` for `algorithm`, expected `naive` or `optimized`")]
    UnknownAlgorithm(String),
    /// Cell size so small relative to the region that the grid cannot be allocated
    #[error("`grid_cell_size` {cell_size} needs {cells} cells over the region, at most {max} allowed")]
    GridTooLarge { cell_size: f64, cells: f64, max: usize },
}

/// Which population an entity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Agent,
    Source,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Agent => write!(f, "agent"),
            EntityKind::Source => write!(f, "source"),
        }
    }
}

/// Errors returned by the simulation engine.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Position or velocity became NaN or infinite during a tick
    #[error("non-finite {kind} state at index {index} during tick {tick}")]
    NonFinite {
        kind: EntityKind,
        index: usize,
        tick: u64,
    },
    /// Host clock reading that cannot produce a time step
    #[error("host timestamp must be finite, got {0}")]
    InvalidTimestamp(f64),
    /// A previous tick failed; the engine refuses to continue until reset
    #[error("engine faulted during tick {tick}, reset required")]
    Faulted { tick: u64 },
}
