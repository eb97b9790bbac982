//! Simulation configuration and structured error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the simulator.
///
/// These are designed to be displayable in both CLI and TUI contexts.
#[derive(Debug, Clone, Error)]
pub enum SimulationError {
    #[error("insufficient data: need at least 2 price points, got {points}")]
    InsufficientData { points: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Configuration for a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of independent paths to generate (N ≥ 1).
    pub num_paths: usize,

    /// Forecast horizon in days (H ≥ 1). Day 0 is the starting price.
    pub horizon_days: usize,

    /// Master seed. `None` draws one from OS entropy; the drawn value is
    /// recorded in the result so the run can be replayed.
    pub seed: Option<u64>,

    /// Retain the full `[path][day]` matrix in the result. Off by default;
    /// per-day summaries and final prices are always kept.
    #[serde(default)]
    pub retain_paths: bool,
}

impl SimulationConfig {
    pub fn new(num_paths: usize, horizon_days: usize, seed: Option<u64>) -> Self {
        Self {
            num_paths,
            horizon_days,
            seed,
            retain_paths: false,
        }
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.num_paths == 0 {
            return Err(SimulationError::InvalidParameter(
                "num_paths must be at least 1".into(),
            ));
        }
        if self.horizon_days == 0 {
            return Err(SimulationError::InvalidParameter(
                "horizon_days must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_config_passes() {
        assert!(SimulationConfig::new(1000, 30, Some(42)).validate().is_ok());
        assert!(SimulationConfig::new(1, 1, None).validate().is_ok());
    }

    #[test]
    fn zero_paths_rejected() {
        let err = SimulationConfig::new(0, 30, None).validate().unwrap_err();
        assert!(matches!(err, SimulationError::InvalidParameter(_)));
    }

    #[test]
    fn zero_horizon_rejected() {
        let err = SimulationConfig::new(100, 0, None).validate().unwrap_err();
        assert!(matches!(err, SimulationError::InvalidParameter(_)));
    }

    #[test]
    fn config_serialization_roundtrip() {
        let config = SimulationConfig::new(500, 90, Some(7));
        let json = serde_json::to_string(&config).unwrap();
        let back: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
