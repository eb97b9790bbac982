//! Download orchestrator — coordinates multi-coin downloads with progress reporting.

use chrono::Duration;

use super::cache::{CoverageResult, ParquetCache};
use super::ingest;
use super::provider::{DataError, DownloadProgress, PriceProvider};

/// Download multiple coins, running them through the ingest pipeline and caching.
///
/// Coins whose cache already covers the trailing `days` window are skipped
/// unless `force` is set. Returns a summary of successes and failures.
pub fn download_coins(
    provider: &dyn PriceProvider,
    cache: &ParquetCache,
    coin_ids: &[&str],
    vs_currency: &str,
    days: u32,
    force: bool,
    progress: &dyn DownloadProgress,
) -> DownloadSummary {
    let total = coin_ids.len();
    let mut succeeded = 0;
    let mut failed = 0;
    let mut errors: Vec<(String, DataError)> = Vec::new();

    let today = chrono::Local::now().date_naive();
    let span_start = today - Duration::days(days as i64);

    for (i, coin_id) in coin_ids.iter().enumerate() {
        progress.on_start(coin_id, i, total);

        // Skip if cache is fresh and not forcing
        if !force {
            if let CoverageResult::FullyCovered =
                cache.covers_range(coin_id, vs_currency, span_start, today)
            {
                progress.on_complete(coin_id, i, total, &Ok(()));
                succeeded += 1;
                continue;
            }
        }

        let result = download_single(provider, cache, coin_id, vs_currency, days);
        progress.on_complete(coin_id, i, total, &result);

        match result {
            Ok(()) => succeeded += 1,
            Err(e) => {
                errors.push((coin_id.to_string(), e));
                failed += 1;
            }
        }
    }

    progress.on_batch_complete(succeeded, failed, total);

    DownloadSummary {
        total,
        succeeded,
        failed,
        errors,
    }
}

/// Download a single coin: fetch → ingest → cache.
fn download_single(
    provider: &dyn PriceProvider,
    cache: &ParquetCache,
    coin_id: &str,
    vs_currency: &str,
    days: u32,
) -> Result<(), DataError> {
    let fetch_result = provider.fetch(coin_id, vs_currency, days)?;
    let source = fetch_result.source;
    let ingested = ingest::ingest(fetch_result)?;
    cache.write(&ingested.series, source)?;
    Ok(())
}

/// Summary of a batch download operation.
#[derive(Debug)]
pub struct DownloadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<(String, DataError)>,
}

impl DownloadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::{DataSource, FetchResult, RawPricePoint};
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_cache_dir() -> std::path::PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir()
            .join(format!("montelab_download_test_{}_{id}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Provider serving a two-day fixture, counting calls.
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
            _days: u32,
        ) -> Result<FetchResult, DataError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if coin_id == "nocoin" {
                return Err(DataError::CoinNotFound {
                    coin_id: coin_id.to_string(),
                });
            }
            // Yesterday and today, so the cached span ends at the current date.
            let now_ms = chrono::Local::now()
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc()
                .timestamp_millis();
            Ok(FetchResult {
                coin_id: coin_id.to_string(),
                vs_currency: vs_currency.to_string(),
                points: vec![
                    RawPricePoint {
                        timestamp_ms: now_ms - 86_400_000,
                        price: 100.0,
                    },
                    RawPricePoint {
                        timestamp_ms: now_ms,
                        price: 105.0,
                    },
                ],
                source: DataSource::CoinGecko,
            })
        }
    }

    /// Progress sink that ignores everything.
    struct SilentProgress;

    impl DownloadProgress for SilentProgress {
        fn on_start(&self, _: &str, _: usize, _: usize) {}
        fn on_complete(&self, _: &str, _: usize, _: usize, _: &Result<(), DataError>) {}
        fn on_batch_complete(&self, _: usize, _: usize, _: usize) {}
    }

    #[test]
    fn batch_download_caches_and_summarizes() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);
        let provider = FixtureProvider::new();

        let summary = download_coins(
            &provider,
            &cache,
            &["bitcoin", "nocoin"],
            "usd",
            30,
            false,
            &SilentProgress,
        );

        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_succeeded());
        assert!(matches!(
            summary.errors[0].1,
            DataError::CoinNotFound { .. }
        ));

        assert!(cache.load("bitcoin", "usd").is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn force_redownloads_cached_coin() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);
        let provider = FixtureProvider::new();

        download_coins(&provider, &cache, &["bitcoin"], "usd", 1, false, &SilentProgress);
        assert_eq!(provider.calls.load(Ordering::Relaxed), 1);

        // Covered span → skipped without force
        download_coins(&provider, &cache, &["bitcoin"], "usd", 1, false, &SilentProgress);
        assert_eq!(provider.calls.load(Ordering::Relaxed), 1);

        // Forced → fetched again
        let summary =
            download_coins(&provider, &cache, &["bitcoin"], "usd", 1, true, &SilentProgress);
        assert_eq!(provider.calls.load(Ordering::Relaxed), 2);
        assert!(summary.all_succeeded());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
