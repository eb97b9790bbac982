//! Serializable forecast configuration.
//!
//! Parsed from TOML; the run id is a BLAKE3 hash of the canonical JSON
//! encoding, so identical configs share artifact directories.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Unique identifier for a forecast run (content-addressable hash).
pub type RunId = String;

/// Errors from config loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete configuration for a single forecast run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastConfig {
    pub forecast: ForecastSection,
    pub simulation: SimulationSection,
}

/// What to forecast: the coin and how much history to learn from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastSection {
    /// CoinGecko coin id (e.g. "bitcoin", "solana"). Lowercased on load.
    pub coin: String,

    /// Quote currency.
    #[serde(default = "default_vs_currency")]
    pub vs_currency: String,

    /// Trailing window of history to fetch, in days.
    #[serde(default = "default_history_days")]
    pub history_days: u32,
}

/// Simulation shape: paths, horizon, optional seed and principal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationSection {
    /// Number of Monte Carlo paths.
    pub paths: usize,

    /// Forecast horizon in days.
    pub horizon_days: usize,

    /// Master seed; omit for a fresh entropy-drawn run.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Initial investment; enables the final-value projection when set.
    #[serde(default)]
    pub principal: Option<f64>,
}

fn default_vs_currency() -> String {
    "usd".to_string()
}

fn default_history_days() -> u32 {
    365
}

impl ForecastConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: ForecastConfig = toml::from_str(content)?;
        config.forecast.coin = config.forecast.coin.trim().to_lowercase();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.forecast.coin.is_empty() {
            return Err(ConfigError::Invalid("coin must not be empty".into()));
        }
        if self.forecast.vs_currency.is_empty() {
            return Err(ConfigError::Invalid("vs_currency must not be empty".into()));
        }
        if self.forecast.history_days == 0 {
            return Err(ConfigError::Invalid(
                "history_days must be at least 1".into(),
            ));
        }
        if self.simulation.paths == 0 {
            return Err(ConfigError::Invalid("paths must be at least 1".into()));
        }
        if self.simulation.horizon_days == 0 {
            return Err(ConfigError::Invalid(
                "horizon_days must be at least 1".into(),
            ));
        }
        if let Some(principal) = self.simulation.principal {
            if !principal.is_finite() || principal <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "principal must be positive, got {principal}"
                )));
            }
        }
        Ok(())
    }

    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs get the same RunId and share an
    /// artifact directory.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("ForecastConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
