//! Configuration System
//!
//! Engine settings loaded from TOML. Every field has a default, so a partial
//! file (or none at all) yields a runnable configuration.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::spatial::GridSpec;

/// Default config file path for the headless runner
pub const DEFAULT_CONFIG_PATH: &str = "opinion_flock.toml";

/// Influence resolution strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Algorithm {
    /// All-pairs agent x source scan
    Naive,
    /// 3x3 neighbourhood lookups in a grid over sources
    #[default]
    Optimized,
}

impl Algorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Naive => "naive",
            Algorithm::Optimized => "optimized",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "naive" => Ok(Algorithm::Naive),
            "optimized" => Ok(Algorithm::Optimized),
            _ => Err(ConfigError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl TryFrom<String> for Algorithm {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Algorithm> for String {
    fn from(algorithm: Algorithm) -> Self {
        algorithm.as_str().to_string()
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of follower agents
    pub agent_count: usize,
    /// Number of opinion sources
    pub source_count: usize,
    /// Influence resolution strategy
    pub algorithm: Algorithm,
    /// Multiplier applied to every frame delta
    pub speed_multiplier: f32,
    pub region_width: f32,
    pub region_height: f32,
    /// Edge length of spatial grid cells
    pub grid_cell_size: f32,
    /// Radius given to spawned sources; influence reaches 3x this
    pub source_radius: f32,
    /// Seed for placement and jitter
    pub seed: u64,
    /// Length of a throughput reporting window
    pub metrics_window_ms: f64,
    /// Flocking force tuning
    pub flocking: FlockingConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            agent_count: 300,
            source_count: 8,
            algorithm: Algorithm::Optimized,
            speed_multiplier: 1.0,
            region_width: 800.0,
            region_height: 600.0,
            grid_cell_size: 50.0,
            source_radius: 30.0,
            seed: 42,
            metrics_window_ms: 1000.0,
            flocking: FlockingConfig::default(),
        }
    }
}

impl SimConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Returns this configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects configurations the engine cannot start with, naming the field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("agent_count", self.agent_count as f64)?;
        require_positive("source_count", self.source_count as f64)?;
        require_positive("region_width", self.region_width as f64)?;
        require_positive("region_height", self.region_height as f64)?;
        require_positive("speed_multiplier", self.speed_multiplier as f64)?;
        require_positive("grid_cell_size", self.grid_cell_size as f64)?;
        require_positive("source_radius", self.source_radius as f64)?;
        require_positive("metrics_window_ms", self.metrics_window_ms)?;
        self.grid_spec()?;
        self.flocking.validate()
    }

    /// Grid geometry for the configured region and cell size
    pub fn grid_spec(&self) -> Result<GridSpec, ConfigError> {
        GridSpec::new(self.grid_cell_size, self.region_width, self.region_height)
    }
}

/// Flocking force tuning. Defaults reproduce the reference behaviour.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockingConfig {
    /// Neighbours closer than this push the agent away
    pub separation_radius: f32,
    /// Radical neighbours closer than this contribute alignment and cohesion
    pub flock_radius: f32,
    /// Half-width of the uniform velocity jitter
    pub jitter: f32,
    pub radical_separation_weight: f32,
    pub neutral_separation_weight: f32,
    /// Pull toward the neighbour-average velocity
    pub alignment_weight: f32,
    /// Pull toward the neighbour centroid
    pub cohesion_weight: f32,
    pub radical_speed: f32,
    pub neutral_speed: f32,
    /// Fraction of the gap to target speed closed per tick
    pub speed_correction: f32,
    /// Below this speed no correction is applied
    pub min_correctable_speed: f32,
}

impl Default for FlockingConfig {
    fn default() -> Self {
        Self {
            separation_radius: 30.0,
            flock_radius: 80.0,
            jitter: 0.15,
            radical_separation_weight: 0.15,
            neutral_separation_weight: 0.05,
            alignment_weight: 0.08,
            cohesion_weight: 0.025,
            radical_speed: 3.5,
            neutral_speed: 1.5,
            speed_correction: 0.15,
            min_correctable_speed: 0.1,
        }
    }
}

impl FlockingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("flocking.separation_radius", self.separation_radius)?;
        require_non_negative("flocking.flock_radius", self.flock_radius)?;
        require_non_negative("flocking.jitter", self.jitter)?;
        require_non_negative("flocking.radical_separation_weight", self.radical_separation_weight)?;
        require_non_negative("flocking.neutral_separation_weight", self.neutral_separation_weight)?;
        require_non_negative("flocking.alignment_weight", self.alignment_weight)?;
        require_non_negative("flocking.cohesion_weight", self.cohesion_weight)?;
        require_non_negative("flocking.radical_speed", self.radical_speed)?;
        require_non_negative("flocking.neutral_speed", self.neutral_speed)?;
        require_non_negative("flocking.speed_correction", self.speed_correction)?;
        // Divides the target speed, so zero is not allowed
        require_positive("flocking.min_correctable_speed", self.min_correctable_speed as f64)
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn require_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative {
            field,
            value: value as f64,
        })
    }
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Opinion flocking engine configuration

agent_count = 300
source_count = 8
algorithm = "optimized"
speed_multiplier = 1.0
region_width = 800.0
region_height = 600.0
grid_cell_size = 50.0
source_radius = 30.0
seed = 42
metrics_window_ms = 1000.0

[flocking]
separation_radius = 30.0
flock_radius = 80.0
jitter = 0.15
radical_separation_weight = 0.15
neutral_separation_weight = 0.05
alignment_weight = 0.08
cohesion_weight = 0.025
radical_speed = 3.5
neutral_speed = 1.5
speed_correction = 0.15
min_correctable_speed = 0.1
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();

        assert_eq!(config.agent_count, 300);
        assert_eq!(config.source_count, 8);
        assert_eq!(config.algorithm, Algorithm::Optimized);
        assert_eq!(config.grid_cell_size, 50.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_toml_parses() {
        let config = SimConfig::from_str(&default_config_toml()).unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
            agent_count = 50
            algorithm = "naive"

            [flocking]
            jitter = 0.0
        "#;

        let config = SimConfig::from_str(toml).unwrap();

        // Specified values
        assert_eq!(config.agent_count, 50);
        assert_eq!(config.algorithm, Algorithm::Naive);
        assert_eq!(config.flocking.jitter, 0.0);
        // Default values
        assert_eq!(config.source_count, 8);
        assert_eq!(config.flocking.radical_speed, 3.5);
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let err = SimConfig::from_str(r#"algorithm = "quadtree""#).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("quadtree"), "unexpected message: {message}");
        assert!(message.contains("algorithm"), "unexpected message: {message}");
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("naive".parse::<Algorithm>().unwrap(), Algorithm::Naive);
        assert_eq!("Optimized".parse::<Algorithm>().unwrap(), Algorithm::Optimized);
        assert!(matches!(
            "grid".parse::<Algorithm>(),
            Err(ConfigError::UnknownAlgorithm(_))
        ));
        assert_eq!(Algorithm::Naive.to_string(), "naive");
    }

    #[test]
    fn test_validate_names_invalid_field() {
        let cases: Vec<(&str, SimConfig)> = vec![
            ("agent_count", SimConfig { agent_count: 0, ..SimConfig::default() }),
            ("source_count", SimConfig { source_count: 0, ..SimConfig::default() }),
            ("region_width", SimConfig { region_width: 0.0, ..SimConfig::default() }),
            ("region_height", SimConfig { region_height: -10.0, ..SimConfig::default() }),
            ("speed_multiplier", SimConfig { speed_multiplier: 0.0, ..SimConfig::default() }),
            ("grid_cell_size", SimConfig { grid_cell_size: f32::NAN, ..SimConfig::default() }),
        ];

        for (field, config) in cases {
            match config.validate() {
                Err(ConfigError::NonPositive { field: got, .. }) => assert_eq!(got, field),
                other => panic!("expected NonPositive for {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_validate_flocking_tuning() {
        let mut config = SimConfig::default();
        config.flocking.jitter = -0.1;
        match config.validate() {
            Err(ConfigError::Negative { field, .. }) => assert_eq!(field, "flocking.jitter"),
            other => panic!("expected Negative, got {other:?}"),
        }
    }

    #[test]
    fn test_grid_spec() {
        let config = SimConfig::default();
        let spec = config.grid_spec().unwrap();
        assert_eq!((spec.cols(), spec.rows()), (16, 12));
    }

    #[test]
    fn test_validate_rejects_tiny_cells() {
        for cell in [1e-20f32, 0.01] {
            let config = SimConfig {
                grid_cell_size: cell,
                ..SimConfig::default()
            };
            match config.validate() {
                Err(ConfigError::GridTooLarge { .. }) => {}
                other => panic!("expected GridTooLarge for {cell}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_config_to_toml_roundtrip() {
        let config = SimConfig {
            algorithm: Algorithm::Naive,
            seed: 7,
            ..SimConfig::default()
        };
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("algorithm = \"naive\""));
        assert!(toml.contains("[flocking]"));

        let parsed = SimConfig::from_str(&toml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "source_count = 3\nregion_width = 400.0").unwrap();

        let config = SimConfig::from_file(file.path()).unwrap();
        assert_eq!(config.source_count, 3);
        assert_eq!(config.region_width, 400.0);

        let missing = SimConfig::from_file(Path::new("/nonexistent/opinion_flock.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
