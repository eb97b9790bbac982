//! Series loading with cache-first, network-fallback semantics.

use chrono::{Duration, Local};
use thiserror::Error;

use montelab_core::data::{ingest, CoverageResult, DataError, DataSource, ParquetCache, PriceProvider};
use montelab_core::domain::PriceSeries;

/// How to load: span, offline mode, forced refresh.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Trailing window of history, in days.
    pub days: u32,

    /// Never touch the network; cache misses are errors.
    pub offline: bool,

    /// Fetch fresh data even when the cache covers the span.
    pub force: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            days: 365,
            offline: false,
            force: false,
        }
    }
}

/// A loaded series plus its provenance.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: PriceSeries,
    pub source: DataSource,
    pub dataset_hash: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no cached data for '{coin_id}' and offline mode is on")]
    NoCachedDataOffline { coin_id: String },

    #[error("download failed for '{coin_id}': {reason}")]
    DownloadFailed { coin_id: String, reason: String },

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Load a price series, preferring the cache when it covers the span.
///
/// With `force` set the network is tried first; a fresh fetch overwrites the
/// cache. In `offline` mode whatever the cache holds is returned as-is (a
/// shorter-than-requested span is better than no forecast), and a full miss
/// is an error.
pub fn load_series(
    coin_id: &str,
    vs_currency: &str,
    cache: &ParquetCache,
    provider: Option<&dyn PriceProvider>,
    opts: &LoadOptions,
) -> Result<LoadedSeries, LoadError> {
    let today = Local::now().date_naive();
    let span_start = today - Duration::days(opts.days as i64);

    if opts.offline {
        return match cache.load(coin_id, vs_currency) {
            Ok(series) => Ok(loaded(series, DataSource::Cache)),
            Err(DataError::NoCachedData { .. }) => Err(LoadError::NoCachedDataOffline {
                coin_id: coin_id.to_string(),
            }),
            Err(e) => Err(e.into()),
        };
    }

    let covered = matches!(
        cache.covers_range(coin_id, vs_currency, span_start, today - Duration::days(1)),
        CoverageResult::FullyCovered
    );

    if covered && !opts.force {
        match cache.load(coin_id, vs_currency) {
            Ok(series) => return Ok(loaded(series, DataSource::Cache)),
            Err(e) => {
                // Cache claimed coverage but failed to load; fall through.
                log::warn!("cache load failed for {coin_id}/{vs_currency}, refetching: {e}");
            }
        }
    }

    let provider = match provider {
        Some(p) => p,
        None => {
            // No provider wired in; the cache is all we have.
            return match cache.load(coin_id, vs_currency) {
                Ok(series) => Ok(loaded(series, DataSource::Cache)),
                Err(e) => Err(e.into()),
            };
        }
    };

    match fetch_and_cache(provider, cache, coin_id, vs_currency, opts.days) {
        Ok(series) => Ok(loaded(series, DataSource::CoinGecko)),
        Err(fetch_err) => {
            // Stale cache beats a hard failure.
            if let Ok(series) = cache.load(coin_id, vs_currency) {
                log::warn!(
                    "fetch failed for {coin_id}/{vs_currency}, using stale cache: {fetch_err}"
                );
                return Ok(loaded(series, DataSource::Cache));
            }
            Err(LoadError::DownloadFailed {
                coin_id: coin_id.to_string(),
                reason: fetch_err.to_string(),
            })
        }
    }
}

fn fetch_and_cache(
    provider: &dyn PriceProvider,
    cache: &ParquetCache,
    coin_id: &str,
    vs_currency: &str,
    days: u32,
) -> Result<PriceSeries, DataError> {
    let fetched = provider.fetch(coin_id, vs_currency, days)?;
    let ingested = ingest(fetched)?;
    if ingested.dropped > 0 {
        log::debug!(
            "dropped {} invalid samples for {coin_id}/{vs_currency}",
            ingested.dropped
        );
    }
    cache.write(&ingested.series, DataSource::CoinGecko)?;
    Ok(ingested.series)
}

fn loaded(series: PriceSeries, source: DataSource) -> LoadedSeries {
    let dataset_hash = series.data_hash();
    LoadedSeries {
        series,
        source,
        dataset_hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use montelab_core::data::{FetchResult, RawPricePoint};
    use montelab_core::domain::PricePoint;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_cache_dir() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "montelab_loader_test_{}_{id}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Provider that serves a fixed recent series and counts calls.
    struct FixtureProvider {
        calls: AtomicUsize,
    }

    impl FixtureProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PriceProvider for FixtureProvider {
        fn name(&self) -> &str {
            "fixture"
        }

        fn fetch(
            &self,
            coin_id: &str,
            vs_currency: &str,
            days: u32,
        ) -> Result<FetchResult, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let today = Local::now().date_naive();
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
            let points = (0..days as i64)
                .map(|i| {
                    let date = today - Duration::days(days as i64 - i);
                    RawPricePoint {
                        timestamp_ms: (date - epoch).num_days() * 86_400_000,
                        price: 100.0 + i as f64,
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

    /// Provider that always fails.
    struct BrokenProvider;

    impl PriceProvider for BrokenProvider {
        fn name(&self) -> &str {
            "broken"
        }

        fn fetch(&self, _: &str, _: &str, _: u32) -> Result<FetchResult, DataError> {
            Err(DataError::NetworkUnreachable("refused".into()))
        }
    }

    fn opts(days: u32) -> LoadOptions {
        LoadOptions {
            days,
            offline: false,
            force: false,
        }
    }

    #[test]
    fn fetches_and_caches_on_miss() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);
        let provider = FixtureProvider::new();

        let loaded = load_series("bitcoin", "usd", &cache, Some(&provider), &opts(30)).unwrap();

        assert_eq!(loaded.source, DataSource::CoinGecko);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(cache.get_meta("bitcoin", "usd").is_some());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn covered_cache_skips_network() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);
        let provider = FixtureProvider::new();

        load_series("bitcoin", "usd", &cache, Some(&provider), &opts(30)).unwrap();
        let second = load_series("bitcoin", "usd", &cache, Some(&provider), &opts(30)).unwrap();

        assert_eq!(second.source, DataSource::Cache);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn force_refetches_despite_coverage() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);
        let provider = FixtureProvider::new();

        load_series("bitcoin", "usd", &cache, Some(&provider), &opts(30)).unwrap();
        let forced = LoadOptions {
            days: 30,
            offline: false,
            force: true,
        };
        let second = load_series("bitcoin", "usd", &cache, Some(&provider), &forced).unwrap();

        assert_eq!(second.source, DataSource::CoinGecko);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn offline_miss_is_an_error() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);

        let offline = LoadOptions {
            days: 30,
            offline: true,
            force: false,
        };
        let err = load_series("bitcoin", "usd", &cache, None, &offline).unwrap_err();
        assert!(matches!(err, LoadError::NoCachedDataOffline { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn offline_hit_uses_cache_even_if_stale() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);

        // Seed the cache with an old series that covers nothing recent.
        let series = PriceSeries::new(
            "bitcoin",
            "usd",
            vec![
                PricePoint {
                    date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                    price: 20000.0,
                },
                PricePoint {
                    date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
                    price: 20500.0,
                },
            ],
        )
        .unwrap();
        cache.write(&series, DataSource::CoinGecko).unwrap();

        let offline = LoadOptions {
            days: 30,
            offline: true,
            force: false,
        };
        let loaded = load_series("bitcoin", "usd", &cache, None, &offline).unwrap();
        assert_eq!(loaded.source, DataSource::Cache);
        assert_eq!(loaded.series, series);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn fetch_failure_falls_back_to_stale_cache() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);

        let series = PriceSeries::new(
            "bitcoin",
            "usd",
            vec![
                PricePoint {
                    date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                    price: 20000.0,
                },
                PricePoint {
                    date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
                    price: 20500.0,
                },
            ],
        )
        .unwrap();
        cache.write(&series, DataSource::CoinGecko).unwrap();

        let loaded =
            load_series("bitcoin", "usd", &cache, Some(&BrokenProvider), &opts(30)).unwrap();
        assert_eq!(loaded.source, DataSource::Cache);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn fetch_failure_without_cache_is_an_error() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);

        let err =
            load_series("bitcoin", "usd", &cache, Some(&BrokenProvider), &opts(30)).unwrap_err();
        assert!(matches!(err, LoadError::DownloadFailed { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
