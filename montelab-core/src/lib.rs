//! MonteLab Core — price series, log returns, and the GBM Monte Carlo simulator.
//!
//! This crate contains the heart of the forecast engine:
//! - Domain types (price points, validated price series, log-return series)
//! - The geometric-Brownian-motion path simulator with percentile summaries
//! - Deterministic RNG hierarchy (master seed → per-path sub-seeds)
//! - Data layer (provider trait, CoinGecko client, ingest, Parquet cache)

pub mod data;
pub mod domain;
pub mod rng;
pub mod sim;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: all core types are Send + Sync.
    ///
    /// The TUI worker thread moves these types across threads; if any type
    /// fails this check, the build breaks immediately.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::PricePoint>();
        require_sync::<domain::PricePoint>();
        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<domain::ReturnSeries>();
        require_sync::<domain::ReturnSeries>();

        // Simulator types
        require_send::<sim::SimulationConfig>();
        require_sync::<sim::SimulationConfig>();
        require_send::<sim::SimulationResult>();
        require_sync::<sim::SimulationResult>();
        require_send::<sim::DaySummary>();
        require_sync::<sim::DaySummary>();
        require_send::<sim::FinalDistribution>();
        require_sync::<sim::FinalDistribution>();
        require_send::<sim::SimulationError>();
        require_sync::<sim::SimulationError>();

        // RNG
        require_send::<rng::RngHierarchy>();
        require_sync::<rng::RngHierarchy>();

        // Data types
        require_send::<data::provider::RawPricePoint>();
        require_sync::<data::provider::RawPricePoint>();
        require_send::<data::provider::FetchResult>();
        require_sync::<data::provider::FetchResult>();
        require_send::<data::provider::DataError>();
        require_sync::<data::provider::DataError>();
        require_send::<data::cache::CacheMeta>();
        require_sync::<data::cache::CacheMeta>();
    }
}
