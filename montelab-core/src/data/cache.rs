//! Parquet cache layer with Hive-style partitioning.
//!
//! Layout: `{cache_dir}/coin={ID}/vs={CURRENCY}/{year}.parquet`
//!
//! Features:
//! - Atomic writes (write to .tmp, rename into place)
//! - Integrity validation on load (schema check, row count > 0)
//! - Quarantine for corrupt files ({filename}.quarantined)
//! - Metadata sidecar per (coin, currency) (hash, date range, source)

use super::provider::{DataError, DataSource};
use crate::domain::{PricePoint, PriceSeries};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata sidecar for a cached (coin, currency) pair.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheMeta {
    pub coin_id: String,
    pub vs_currency: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub point_count: usize,
    pub data_hash: String,
    pub source: String,
    pub cached_at: chrono::NaiveDateTime,
}

/// The Parquet cache.
pub struct ParquetCache {
    cache_dir: PathBuf,
}

impl ParquetCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Root directory of the cache.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Directory for a pair: `{cache_dir}/coin={ID}/vs={CURRENCY}/`
    fn pair_dir(&self, coin_id: &str, vs_currency: &str) -> PathBuf {
        self.cache_dir
            .join(format!("coin={coin_id}"))
            .join(format!("vs={vs_currency}"))
    }

    fn year_path(&self, coin_id: &str, vs_currency: &str, year: i32) -> PathBuf {
        self.pair_dir(coin_id, vs_currency)
            .join(format!("{year}.parquet"))
    }

    fn meta_path(&self, coin_id: &str, vs_currency: &str) -> PathBuf {
        self.pair_dir(coin_id, vs_currency).join("meta.json")
    }

    /// Write a series to the cache.
    ///
    /// Groups points by year and writes one Parquet file per year.
    /// Writes are atomic: write to .tmp then rename.
    pub fn write(&self, series: &PriceSeries, source: DataSource) -> Result<(), DataError> {
        let coin_id = series.coin_id();
        let vs_currency = series.vs_currency();

        let dir = self.pair_dir(coin_id, vs_currency);
        fs::create_dir_all(&dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let mut by_year: HashMap<i32, Vec<PricePoint>> = HashMap::new();
        for point in series.points() {
            by_year.entry(point.date.year()).or_default().push(*point);
        }

        for (year, points) in &by_year {
            let df = points_to_dataframe(points)?;
            let path = self.year_path(coin_id, vs_currency, *year);
            let tmp_path = path.with_extension("parquet.tmp");

            write_parquet(&df, &tmp_path)?;

            fs::rename(&tmp_path, &path).map_err(|e| {
                let _ = fs::remove_file(&tmp_path);
                DataError::CacheError(format!("atomic rename failed: {e}"))
            })?;
        }

        let meta = CacheMeta {
            coin_id: coin_id.to_string(),
            vs_currency: vs_currency.to_string(),
            start_date: series.start_date(),
            end_date: series.end_date(),
            point_count: series.len(),
            data_hash: series.data_hash(),
            source: format!("{source:?}"),
            cached_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(coin_id, vs_currency), meta_json)
            .map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;

        log::info!(
            "cached {} daily prices for {coin_id}/{vs_currency} ({} to {})",
            series.len(),
            series.start_date(),
            series.end_date(),
        );
        Ok(())
    }

    /// Load all cached prices for a pair, rebuilt into a validated series.
    pub fn load(&self, coin_id: &str, vs_currency: &str) -> Result<PriceSeries, DataError> {
        let dir = self.pair_dir(coin_id, vs_currency);
        if !dir.exists() {
            return Err(DataError::NoCachedData {
                coin_id: coin_id.to_string(),
            });
        }

        let mut all_points = Vec::new();

        let entries =
            fs::read_dir(&dir).map_err(|e| DataError::CacheError(format!("read dir: {e}")))?;

        for entry in entries {
            let entry = entry.map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?;
            let path = entry.path();

            // Skip non-parquet files (meta.json, .quarantined, etc)
            if path.extension().and_then(|e| e.to_str()) != Some("parquet") {
                continue;
            }

            match load_and_validate_parquet(&path) {
                Ok(points) => all_points.extend(points),
                Err(e) => {
                    // Quarantine the corrupt file
                    let quarantine = path.with_extension("parquet.quarantined");
                    log::warn!("quarantining corrupt cache file {}: {e}", path.display());
                    let _ = fs::rename(&path, &quarantine);
                }
            }
        }

        if all_points.is_empty() {
            return Err(DataError::NoCachedData {
                coin_id: coin_id.to_string(),
            });
        }

        all_points.sort_by_key(|p| p.date);
        all_points.dedup_by_key(|p| p.date);

        PriceSeries::new(coin_id, vs_currency, all_points)
            .map_err(|e| DataError::ValidationError(e.to_string()))
    }

    /// Return the metadata sidecar for a pair, if cached.
    pub fn get_meta(&self, coin_id: &str, vs_currency: &str) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(coin_id, vs_currency)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Check which coins have cached data for a currency, with date ranges.
    pub fn status(&self, coin_ids: &[&str], vs_currency: &str) -> Vec<CacheStatus> {
        coin_ids
            .iter()
            .map(|coin| {
                let meta = self.get_meta(coin, vs_currency);
                CacheStatus {
                    coin_id: coin.to_string(),
                    vs_currency: vs_currency.to_string(),
                    cached: meta.is_some(),
                    start_date: meta.as_ref().map(|m| m.start_date),
                    end_date: meta.as_ref().map(|m| m.end_date),
                    point_count: meta.as_ref().map(|m| m.point_count),
                }
            })
            .collect()
    }

    /// Check if cached data for a pair covers the requested date range.
    pub fn covers_range(
        &self,
        coin_id: &str,
        vs_currency: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoverageResult {
        match self.get_meta(coin_id, vs_currency) {
            None => CoverageResult::NotCached,
            Some(meta) => {
                if meta.start_date <= start && meta.end_date >= end {
                    CoverageResult::FullyCovered
                } else {
                    CoverageResult::PartiallyCovered {
                        cached_start: meta.start_date,
                        cached_end: meta.end_date,
                    }
                }
            }
        }
    }
}

/// Cache status for a single (coin, currency) pair.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheStatus {
    pub coin_id: String,
    pub vs_currency: String,
    pub cached: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub point_count: Option<usize>,
}

/// How well the cache covers the requested date range.
#[derive(Debug, Clone, PartialEq)]
pub enum CoverageResult {
    NotCached,
    FullyCovered,
    PartiallyCovered {
        cached_start: NaiveDate,
        cached_end: NaiveDate,
    },
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

/// Convert price points to a Polars DataFrame.
fn points_to_dataframe(points: &[PricePoint]) -> Result<DataFrame, DataError> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let dates: Vec<i32> = points
        .iter()
        .map(|p| (p.date - epoch).num_days() as i32)
        .collect();
    let prices: Vec<f64> = points.iter().map(|p| p.price).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))?,
        Column::new("price".into(), prices),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

/// Write a DataFrame to a Parquet file.
fn write_parquet(df: &DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df.clone())
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

/// Load a Parquet file and validate its integrity.
fn load_and_validate_parquet(path: &Path) -> Result<Vec<PricePoint>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::ValidationError("empty parquet file".into()));
    }

    for col_name in ["date", "price"] {
        if df.column(col_name).is_err() {
            return Err(DataError::ValidationError(format!(
                "missing column '{col_name}'"
            )));
        }
    }

    dataframe_to_points(&df)
}

/// Convert a DataFrame back to price points.
fn dataframe_to_points(df: &DataFrame) -> Result<Vec<PricePoint>, DataError> {
    let map_err = |e: PolarsError| DataError::ParquetError(format!("column read: {e}"));

    let dates = df.column("date").map_err(map_err)?;
    let prices = df.column("price").map_err(map_err)?;

    let date_ca = dates
        .date()
        .map_err(|e| DataError::ParquetError(format!("date column type: {e}")))?;
    let price_ca = prices
        .f64()
        .map_err(|e| DataError::ParquetError(format!("price column type: {e}")))?;

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let n = df.height();
    let mut points = Vec::with_capacity(n);

    for i in 0..n {
        let date_days = date_ca
            .get(i)
            .ok_or_else(|| DataError::ParquetError(format!("null date at row {i}")))?;
        let price = price_ca
            .get(i)
            .ok_or_else(|| DataError::ParquetError(format!("null price at row {i}")))?;

        points.push(PricePoint {
            date: epoch + chrono::Duration::days(date_days as i64),
            price,
        });
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_cache_dir() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = env::temp_dir().join(format!("montelab_test_{}_{id}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_series() -> PriceSeries {
        PriceSeries::new(
            "bitcoin",
            "usd",
            vec![
                PricePoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                    price: 42000.0,
                },
                PricePoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                    price: 42500.0,
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn write_and_load_roundtrip() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);

        cache.write(&sample_series(), DataSource::CoinGecko).unwrap();
        let loaded = cache.load("bitcoin", "usd").unwrap();

        assert_eq!(loaded, sample_series());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_nonexistent_returns_error() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);

        let result = cache.load("nocoin", "usd");
        assert!(matches!(result, Err(DataError::NoCachedData { .. })));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn cache_meta_roundtrip() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);

        cache.write(&sample_series(), DataSource::CoinGecko).unwrap();
        let meta = cache.get_meta("bitcoin", "usd").unwrap();

        assert_eq!(meta.coin_id, "bitcoin");
        assert_eq!(meta.point_count, 2);
        assert_eq!(meta.data_hash, sample_series().data_hash());
        assert_eq!(
            meta.start_date,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn cache_status_query() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);

        cache.write(&sample_series(), DataSource::CoinGecko).unwrap();
        let statuses = cache.status(&["bitcoin", "ethereum"], "usd");

        assert_eq!(statuses.len(), 2);
        assert!(statuses[0].cached);
        assert!(!statuses[1].cached);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn coverage_check() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);

        cache.write(&sample_series(), DataSource::CoinGecko).unwrap();

        assert_eq!(
            cache.covers_range(
                "bitcoin",
                "usd",
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
            ),
            CoverageResult::FullyCovered
        );
        assert_eq!(
            cache.covers_range("ethereum", "usd", NaiveDate::default(), NaiveDate::default()),
            CoverageResult::NotCached
        );
        assert!(matches!(
            cache.covers_range(
                "bitcoin",
                "usd",
                NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
            ),
            CoverageResult::PartiallyCovered { .. }
        ));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_file_is_quarantined_not_fatal() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);

        cache.write(&sample_series(), DataSource::CoinGecko).unwrap();

        // Scribble over one year file
        let year_path = dir
            .join("coin=bitcoin")
            .join("vs=usd")
            .join("2024.parquet");
        fs::write(&year_path, b"not parquet").unwrap();

        // Load fails (no healthy partitions left) but quarantines the file
        let result = cache.load("bitcoin", "usd");
        assert!(result.is_err());
        assert!(year_path.with_extension("parquet.quarantined").exists());
        assert!(!year_path.exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn multi_year_series_spans_partitions() {
        let dir = temp_cache_dir();
        let cache = ParquetCache::new(&dir);

        let series = PriceSeries::new(
            "bitcoin",
            "usd",
            vec![
                PricePoint {
                    date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
                    price: 41000.0,
                },
                PricePoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    price: 42000.0,
                },
            ],
        )
        .unwrap();

        cache.write(&series, DataSource::CoinGecko).unwrap();

        assert!(dir.join("coin=bitcoin/vs=usd/2023.parquet").exists());
        assert!(dir.join("coin=bitcoin/vs=usd/2024.parquet").exists());

        let loaded = cache.load("bitcoin", "usd").unwrap();
        assert_eq!(loaded, series);

        let _ = fs::remove_dir_all(&dir);
    }
}
