//! Forecast orchestration: config → data → simulation → result.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use montelab_core::data::{DataSource, ParquetCache, PriceProvider};
use montelab_core::domain::PriceSeries;
use montelab_core::sim::{simulate, SimulationConfig, SimulationError, SimulationResult};

use crate::config::{ConfigError, ForecastConfig, RunId};
use crate::data_loader::{load_series, LoadError, LoadOptions};
use crate::history::HistoryStats;
use crate::investment::InvestmentProjection;

/// Bumped when the manifest layout changes incompatibly.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] LoadError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// Everything a forecast run produced, serialized verbatim as manifest.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub schema_version: u32,
    pub run_id: RunId,
    pub created_at: DateTime<Local>,
    pub config: ForecastConfig,
    /// BLAKE3 hash of the input series, for reproducibility audits.
    pub dataset_hash: String,
    /// Where the history came from (network, cache, or built-in sample).
    pub data_source: DataSource,
    pub history: HistoryStats,
    pub simulation: SimulationResult,
    /// Present only when the config sets a principal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investment: Option<InvestmentProjection>,
}

/// Run a forecast end to end: load history, simulate, project.
pub fn run_forecast(
    config: &ForecastConfig,
    cache: &ParquetCache,
    provider: Option<&dyn PriceProvider>,
    opts: &LoadOptions,
) -> Result<ForecastResult, RunError> {
    config.validate()?;

    let loaded = load_series(
        &config.forecast.coin,
        &config.forecast.vs_currency,
        cache,
        provider,
        opts,
    )?;

    log::info!(
        "loaded {} daily prices for {} from {:?}",
        loaded.series.len(),
        config.forecast.coin,
        loaded.source,
    );

    forecast_loaded(config, &loaded.series, loaded.source, loaded.dataset_hash)
}

/// Run a forecast over an already-loaded series (no I/O).
///
/// Used by the TUI worker and by tests that supply fixture data.
pub fn run_forecast_from_series(
    config: &ForecastConfig,
    series: &PriceSeries,
    source: DataSource,
) -> Result<ForecastResult, RunError> {
    config.validate()?;
    let dataset_hash = series.data_hash();
    forecast_loaded(config, series, source, dataset_hash)
}

fn forecast_loaded(
    config: &ForecastConfig,
    series: &PriceSeries,
    source: DataSource,
    dataset_hash: String,
) -> Result<ForecastResult, RunError> {
    let sim_config = SimulationConfig::new(
        config.simulation.paths,
        config.simulation.horizon_days,
        config.simulation.seed,
    );
    let simulation = simulate(series, &sim_config)?;

    let investment = config
        .simulation
        .principal
        .map(|principal| InvestmentProjection::from_result(&simulation, principal));

    Ok(ForecastResult {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        created_at: Local::now(),
        config: config.clone(),
        dataset_hash,
        data_source: source,
        history: HistoryStats::from_series(series),
        simulation,
        investment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use montelab_core::domain::PricePoint;

    fn config(principal: Option<f64>) -> ForecastConfig {
        ForecastConfig::from_toml(&format!(
            r#"
[forecast]
coin = "bitcoin"
history_days = 30

[simulation]
paths = 200
horizon_days = 15
seed = 42
{}
"#,
            principal
                .map(|p| format!("principal = {p}"))
                .unwrap_or_default()
        ))
        .unwrap()
    }

    fn fixture_series() -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = [100.0, 110.0, 90.0, 120.0, 80.0]
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                price,
            })
            .collect();
        PriceSeries::new("bitcoin", "usd", points).unwrap()
    }

    #[test]
    fn forecast_from_series_is_deterministic() {
        let config = config(None);
        let series = fixture_series();

        let a = run_forecast_from_series(&config, &series, DataSource::Sample).unwrap();
        let b = run_forecast_from_series(&config, &series, DataSource::Sample).unwrap();

        assert_eq!(a.simulation, b.simulation);
        assert_eq!(a.run_id, b.run_id);
        assert_eq!(a.dataset_hash, series.data_hash());
        assert_eq!(a.schema_version, SCHEMA_VERSION);
        assert!(a.investment.is_none());
    }

    #[test]
    fn principal_enables_investment_projection() {
        let result =
            run_forecast_from_series(&config(Some(1000.0)), &fixture_series(), DataSource::Sample)
                .unwrap();

        let investment = result.investment.unwrap();
        assert_eq!(investment.principal, 1000.0);
        assert!(investment.paths_at_or_above_principal <= 200);
    }

    #[test]
    fn history_block_matches_series() {
        let result =
            run_forecast_from_series(&config(None), &fixture_series(), DataSource::Sample)
                .unwrap();

        assert_eq!(result.history.min_price, 80.0);
        assert_eq!(result.history.max_price, 120.0);
        assert_eq!(result.history.point_count, 5);
        assert_eq!(result.simulation.starting_price, 80.0);
    }

    #[test]
    fn manifest_serializes_and_roundtrips() {
        let result =
            run_forecast_from_series(&config(Some(500.0)), &fixture_series(), DataSource::Sample)
                .unwrap();

        let json = serde_json::to_string_pretty(&result).unwrap();
        let back: ForecastResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
    }
}
