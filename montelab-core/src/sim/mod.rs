//! GBM Monte Carlo simulator.

pub mod config;
pub mod engine;
pub mod summary;

pub use config::{SimulationConfig, SimulationError};
pub use engine::{simulate, SimulationResult};
pub use summary::{percentile, DaySummary, FinalDistribution};
