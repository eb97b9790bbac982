//! End-to-end runner checks: config → cached data → simulation → artifacts.

use chrono::{Duration, Local, NaiveDate};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use montelab_core::data::{
    DataError, DataSource, FetchResult, ParquetCache, PriceProvider, RawPricePoint,
};
use montelab_runner::{
    run_forecast, run_forecast_from_series, save_artifacts, ForecastConfig, LoadOptions,
};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_dir(label: &str) -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "montelab_e2e_{label}_{}_{id}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Serves a deterministic 60-day ramp ending yesterday.
struct RampProvider;

impl PriceProvider for RampProvider {
    fn name(&self) -> &str {
        "ramp"
    }

    fn fetch(&self, coin_id: &str, vs_currency: &str, days: u32) -> Result<FetchResult, DataError> {
        let today = Local::now().date_naive();
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        let points = (0..days as i64)
            .map(|i| {
                let date = today - Duration::days(days as i64 - i);
                RawPricePoint {
                    timestamp_ms: (date - epoch).num_days() * 86_400_000,
                    price: 40_000.0 + 50.0 * i as f64,
                }
            })
            .collect();
        Ok(FetchResult {
            coin_id: coin_id.to_string(),
            vs_currency: vs_currency.to_string(),
            points,
            source: DataSource::CoinGecko,
        })
    }
}

fn sample_config() -> ForecastConfig {
    ForecastConfig::from_toml(
        r#"
[forecast]
coin = "bitcoin"
history_days = 60

[simulation]
paths = 300
horizon_days = 20
seed = 42
principal = 1000.0
"#,
    )
    .unwrap()
}

#[test]
fn full_pipeline_network_then_cache() {
    let cache_dir = temp_dir("cache");
    let cache = ParquetCache::new(&cache_dir);
    let config = sample_config();
    let opts = LoadOptions {
        days: 60,
        offline: false,
        force: false,
    };

    let first = run_forecast(&config, &cache, Some(&RampProvider), &opts).unwrap();
    assert_eq!(first.data_source, DataSource::CoinGecko);

    // Second run hits the cache and reproduces the simulation exactly.
    let second = run_forecast(&config, &cache, Some(&RampProvider), &opts).unwrap();
    assert_eq!(second.data_source, DataSource::Cache);
    assert_eq!(second.simulation, first.simulation);
    assert_eq!(second.dataset_hash, first.dataset_hash);

    let _ = std::fs::remove_dir_all(&cache_dir);
}

#[test]
fn artifacts_land_under_run_id() {
    let cache_dir = temp_dir("cache");
    let output_dir = temp_dir("output");
    let cache = ParquetCache::new(&cache_dir);
    let config = sample_config();
    let opts = LoadOptions {
        days: 60,
        offline: false,
        force: false,
    };

    let result = run_forecast(&config, &cache, Some(&RampProvider), &opts).unwrap();
    let paths = save_artifacts(&result, &output_dir).unwrap();

    assert_eq!(paths.run_dir, output_dir.join(config.run_id()));
    assert!(paths.manifest.exists());
    assert!(paths.bands_csv.exists());
    assert!(paths.final_values_csv.exists());

    let _ = std::fs::remove_dir_all(&cache_dir);
    let _ = std::fs::remove_dir_all(&output_dir);
}

#[test]
fn offline_without_cache_fails() {
    let cache_dir = temp_dir("cache");
    let cache = ParquetCache::new(&cache_dir);
    let opts = LoadOptions {
        days: 60,
        offline: true,
        force: false,
    };

    let err = run_forecast(&sample_config(), &cache, None, &opts).unwrap_err();
    assert!(err.to_string().contains("offline"));

    let _ = std::fs::remove_dir_all(&cache_dir);
}

#[test]
fn from_series_matches_full_pipeline_simulation() {
    // Same data through both entry points gives the same simulation.
    let cache_dir = temp_dir("cache");
    let cache = ParquetCache::new(&cache_dir);
    let config = sample_config();
    let opts = LoadOptions {
        days: 60,
        offline: false,
        force: false,
    };

    let full = run_forecast(&config, &cache, Some(&RampProvider), &opts).unwrap();
    let cached_series = cache.load("bitcoin", "usd").unwrap();
    let direct = run_forecast_from_series(&config, &cached_series, DataSource::Cache).unwrap();

    assert_eq!(direct.simulation, full.simulation);
    assert_eq!(direct.history, full.history);
    assert_eq!(direct.investment, full.investment);

    let _ = std::fs::remove_dir_all(&cache_dir);
}
