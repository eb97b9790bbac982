//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over the upstream market-data source
//! (CoinGecko today) so the runner can swap implementations and tests can
//! mock the network entirely.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw (timestamp, price) sample from a provider, before ingest/validation.
///
/// CoinGecko timestamps are milliseconds since the Unix epoch; granularity
/// varies with the requested span (hourly under 91 days, daily above).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPricePoint {
    pub timestamp_ms: i64,
    pub price: f64,
}

/// Structured error types for data operations.
///
/// These are designed to be displayable in both CLI and TUI contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("coin not found: {coin_id}")]
    CoinNotFound { coin_id: String },

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("no cached data for coin '{coin_id}' — run `download {coin_id}` first")]
    NoCachedData { coin_id: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Result of a successful fetch for a single coin.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub coin_id: String,
    pub vs_currency: String,
    pub points: Vec<RawPricePoint>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    CoinGecko,
    Cache,
    Sample,
}

/// Trait for price providers.
///
/// Implementations handle the specifics of one upstream API. The cache layer
/// sits above this trait — providers don't know about the cache.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily prices for a coin over the trailing `days` window.
    fn fetch(&self, coin_id: &str, vs_currency: &str, days: u32) -> Result<FetchResult, DataError>;
}

/// Progress callback for multi-coin operations.
pub trait DownloadProgress: Send {
    /// Called when starting to fetch a coin.
    fn on_start(&self, coin_id: &str, index: usize, total: usize);

    /// Called when a coin fetch completes.
    fn on_complete(&self, coin_id: &str, index: usize, total: usize, result: &Result<(), DataError>);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_start(&self, coin_id: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {coin_id}...", index + 1, total);
    }

    fn on_complete(
        &self,
        coin_id: &str,
        _index: usize,
        _total: usize,
        result: &Result<(), DataError>,
    ) {
        match result {
            Ok(()) => println!("  OK: {coin_id}"),
            Err(e) => println!("  FAIL: {coin_id}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nDownload complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}
