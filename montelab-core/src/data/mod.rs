//! Data layer: provider trait, CoinGecko client, ingest, Parquet cache.

pub mod cache;
pub mod coingecko;
pub mod download;
pub mod ingest;
pub mod provider;

pub use cache::{CacheMeta, CacheStatus, CoverageResult, ParquetCache};
pub use coingecko::CoinGeckoProvider;
pub use download::{download_coins, DownloadSummary};
pub use ingest::{ingest, IngestResult};
pub use provider::{
    DataError, DataSource, DownloadProgress, FetchResult, PriceProvider, RawPricePoint,
    StdoutProgress,
};
