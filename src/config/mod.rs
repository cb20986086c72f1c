//! Configuration for the BAC model
//!
//! A [BacConfig] is read once at start-up, usually from a JSON file, and
//! turned into the [BacModel] that every [crate::Person] is built with. The
//! model carries both the increase strategy and the [DecayModel]. Nothing is
//! loaded implicitly.
//!
//! ```json
//! {
//!     "strategy": "polynomial",
//!     "coefficients_path": "bac_polyfit.json",
//!     "decay_per_hour": 0.015,
//!     "elapsed": "total"
//! }
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::increase::{BacModel, BacTable, IncreaseModel, Polynomial};
use crate::BacError;

/// Standard elimination rate, BAC per hour
pub const DEFAULT_DECAY_PER_HOUR: f64 = 0.015;

const SECONDS_PER_HOUR: f64 = 3600.0;
const SECONDS_PER_DAY: i64 = 86_400;

/// Error type for reading configuration
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    SerdeError(String),
    #[error("Decay rate must be finite and non-negative, got {0}")]
    InvalidDecayRate(f64),
}

/// Which BAC increase model to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Lookup in the tabulated grid
    Table,
    /// The fitted polynomial surface
    #[default]
    Polynomial,
}

/// How the time between two log entries is converted to hours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElapsedTime {
    /// The full elapsed time, including whole days
    #[default]
    Total,
    /// Only the part of the elapsed time within the last day
    ///
    /// Whole days are dropped, so a gap of 25 hours counts as 1 hour.
    /// Kept for reproducing logs computed this way.
    SubDay,
}

/// Linear elimination of alcohol over time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayModel {
    per_hour: f64,
    elapsed: ElapsedTime,
}

impl DecayModel {
    pub fn new(per_hour: f64, elapsed: ElapsedTime) -> Self {
        DecayModel { per_hour, elapsed }
    }

    /// BAC eliminated per hour
    pub fn per_hour(&self) -> f64 {
        self.per_hour
    }

    pub fn elapsed(&self) -> ElapsedTime {
        self.elapsed
    }

    /// Hours between `start` and `end`, counted in whole seconds
    pub fn hours_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
        let seconds = (end - start).num_seconds();
        let seconds = match self.elapsed {
            ElapsedTime::Total => seconds,
            ElapsedTime::SubDay => seconds.rem_euclid(SECONDS_PER_DAY),
        };
        seconds as f64 / SECONDS_PER_HOUR
    }

    /// BAC eliminated between `start` and `end`
    pub fn decrease(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
        self.hours_between(start, end) * self.per_hour
    }
}

impl Default for DecayModel {
    fn default() -> Self {
        DecayModel::new(DEFAULT_DECAY_PER_HOUR, ElapsedTime::Total)
    }
}

/// Settings for building the BAC model at start-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BacConfig {
    /// Increase model to build
    pub strategy: Strategy,
    /// CSV table to load, the embedded table when absent
    pub table_path: Option<PathBuf>,
    /// Fitted coefficients to load, the built-in surface when absent
    pub coefficients_path: Option<PathBuf>,
    /// BAC eliminated per hour
    pub decay_per_hour: f64,
    /// How elapsed time is measured
    pub elapsed: ElapsedTime,
}

impl Default for BacConfig {
    fn default() -> Self {
        BacConfig {
            strategy: Strategy::default(),
            table_path: None,
            coefficients_path: None,
            decay_per_hour: DEFAULT_DECAY_PER_HOUR,
            elapsed: ElapsedTime::default(),
        }
    }
}

impl BacConfig {
    /// Parse a configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: BacConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::SerdeError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_json_str(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.decay_per_hour.is_finite() || self.decay_per_hour < 0.0 {
            return Err(ConfigError::InvalidDecayRate(self.decay_per_hour));
        }
        Ok(())
    }

    /// The decay settings
    pub fn decay(&self) -> DecayModel {
        DecayModel::new(self.decay_per_hour, self.elapsed)
    }

    /// Build the configured increase strategy and elimination
    pub fn build(&self) -> Result<BacModel, BacError> {
        self.validate()?;
        let model: IncreaseModel = match self.strategy {
            Strategy::Table => match &self.table_path {
                Some(path) => BacTable::from_csv_path(path)?.into(),
                None => BacTable::embedded()?.into(),
            },
            Strategy::Polynomial => match &self.coefficients_path {
                Some(path) => Polynomial::load_json(path)?.into(),
                None => Polynomial::fallback().into(),
            },
        };
        tracing::debug!("Built {:?} BAC increase model", self.strategy);
        Ok(BacModel::new(model, self.decay()))
    }
}
