//! MonteLab Runner — forecast orchestration on top of `montelab-core`.
//!
//! This crate provides:
//! - TOML forecast configuration with content-addressed run ids
//! - Series loading with cache → network fallback
//! - The `run_forecast` entry points (with and without I/O)
//! - Investment-value projection from terminal prices
//! - Artifact export (manifest JSON, band and final-value CSVs)

pub mod config;
pub mod data_loader;
pub mod export;
pub mod history;
pub mod investment;
pub mod runner;

pub use config::{ConfigError, ForecastConfig, ForecastSection, SimulationSection};
pub use data_loader::{load_series, LoadError, LoadOptions, LoadedSeries};
pub use export::{save_artifacts, ArtifactPaths};
pub use history::HistoryStats;
pub use investment::InvestmentProjection;
pub use runner::{run_forecast, run_forecast_from_series, ForecastResult, RunError};
