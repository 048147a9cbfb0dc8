//! Configuration management for Pointgate
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. `pointgate.local.toml` (gitignored, local overrides)
//! 2. `pointgate.toml` (git-tracked, project config)
//! 3. Built-in defaults (lowest precedence)
//!
//! Later sources only fill in what earlier sources left unset; each file is
//! a complete-or-partial TOML document deserialized with `#[serde(default)]`
//! against whatever the previous layer produced.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod error;

pub use error::ConfigError;

/// Project config file name.
pub const CONFIG_FILE: &str = "pointgate.toml";

/// Local (gitignored) override file name.
pub const LOCAL_CONFIG_FILE: &str = "pointgate.local.toml";

/// Main Pointgate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PointgateConfig {
    pub policy: PolicyConfig,
    pub sim: SimConfig,
}

/// Sizing knobs for the rule store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Housekeeping roster capacity: the maximum number of rules tracked
    /// for eviction. Rules stored past this count are never auto-evicted.
    pub max_rules: usize,
    /// Pre-size hint for the data-point hash indices.
    pub estimated_data_points: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_rules: 200,
            estimated_data_points: 30_000,
        }
    }
}

/// Defaults for the discrete-event simulation harness.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Mean of the per-epoch arrival count distribution.
    pub mean: f64,
    /// Standard deviation of the arrival count distribution.
    pub sigma: f64,
    /// Inter-arrival interval in seconds (the producer sleeps this long
    /// between bursts).
    pub lambda: f64,
    /// Number of arrival epochs to simulate.
    pub epochs: usize,
    /// Hard ceiling on total objects across the whole run.
    pub max_objects: usize,
    /// Per-epoch arrival counts CSV.
    pub arrivals_csv: PathBuf,
    /// Per-epoch cycle sums CSV.
    pub cycle_sums_csv: PathBuf,
    /// Periodic steady-state (mean + confidence interval) CSV.
    pub steady_state_csv: PathBuf,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            mean: 5.0,
            sigma: 2.0,
            lambda: 0.05,
            epochs: 1000,
            max_objects: 100_000,
            arrivals_csv: PathBuf::from("arrivals.csv"),
            cycle_sums_csv: PathBuf::from("cycle_sums.csv"),
            steady_state_csv: PathBuf::from("steady_state.csv"),
        }
    }
}

impl PointgateConfig {
    /// Loads configuration from a project directory, applying the precedence
    /// chain: local overrides, then project config, then defaults.
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let local = project_dir.join(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(&local);
        }

        let project = project_dir.join(CONFIG_FILE);
        if project.exists() {
            return Self::from_file(&project);
        }

        Ok(Self::default())
    }

    /// Loads configuration from a single TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            toml::from_str(&contents).map_err(|source| ConfigError::ParseError {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.policy.max_rules == 0 {
            return Err(ConfigError::ValidationError(
                "policy.max_rules must be at least 1".to_string(),
            ));
        }
        if self.sim.sigma < 0.0 {
            return Err(ConfigError::ValidationError(
                "sim.sigma must be non-negative".to_string(),
            ));
        }
        if self.sim.lambda <= 0.0 {
            return Err(ConfigError::ValidationError(
                "sim.lambda must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
