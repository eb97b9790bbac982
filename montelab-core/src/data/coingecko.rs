//! CoinGecko market-data provider.
//!
//! Fetches historical prices from the public `market_chart` endpoint.
//! Handles rate limiting, retries with exponential backoff, and response
//! parsing. No API key is required for the free tier, but it is aggressively
//! rate limited — batch downloads should expect 429s and back off.

use super::provider::{DataError, DataSource, FetchResult, PriceProvider, RawPricePoint};
use serde::Deserialize;
use std::time::Duration;

/// Upper bound on a server-requested `Retry-After` wait. The free tier
/// normally asks for 60s; anything larger is treated as this cap.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(90);

/// CoinGecko `market_chart` response: `{"prices": [[ts_ms, price], ...]}`.
///
/// The endpoint also returns market caps and volumes; we only deserialize
/// the field we consume.
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Vec<[f64; 2]>,
}

/// CoinGecko error body, e.g. `{"error": "coin not found"}` on 404.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

/// CoinGecko price provider.
pub struct CoinGeckoProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl CoinGeckoProvider {
    pub fn new() -> Self {
        Self::with_base_url("https://api.coingecko.com/api/v3")
    }

    /// Point the client at a different base URL. Tests use this to hit a
    /// local mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("montelab/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }

    /// Build the market_chart URL for a coin, currency, and trailing window.
    fn chart_url(&self, coin_id: &str, vs_currency: &str, days: u32) -> String {
        format!(
            "{}/coins/{coin_id}/market_chart?vs_currency={vs_currency}&days={days}",
            self.base_url
        )
    }

    /// Parse the market_chart response into raw points.
    fn parse_response(
        coin_id: &str,
        resp: MarketChartResponse,
    ) -> Result<Vec<RawPricePoint>, DataError> {
        if resp.prices.is_empty() {
            return Err(DataError::CoinNotFound {
                coin_id: coin_id.to_string(),
            });
        }

        let points = resp
            .prices
            .iter()
            .map(|&[ts_ms, price]| RawPricePoint {
                timestamp_ms: ts_ms as i64,
                price,
            })
            .collect();

        Ok(points)
    }

    /// Delay before retry `attempt` (1-based): exponential backoff, except a
    /// 429's `Retry-After` takes precedence when it asks for longer, capped
    /// at [`MAX_RETRY_AFTER`].
    fn retry_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let backoff = self.base_delay * 2u32.pow(attempt - 1);
        match retry_after {
            Some(requested) => requested.min(MAX_RETRY_AFTER).max(backoff),
            None => backoff,
        }
    }

    /// Execute the HTTP request with retry and backoff.
    fn fetch_with_retry(
        &self,
        coin_id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<Vec<RawPricePoint>, DataError> {
        let url = self.chart_url(coin_id, vs_currency, days);
        let mut last_error = None;
        let mut retry_after: Option<Duration> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                std::thread::sleep(self.retry_delay(attempt, retry_after.take()));
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::NOT_FOUND {
                        // CoinGecko 404s on unknown coin ids — not retryable.
                        let detail = resp
                            .json::<ErrorResponse>()
                            .ok()
                            .and_then(|e| e.error)
                            .unwrap_or_default();
                        log::warn!("coin '{coin_id}' not found: {detail}");
                        return Err(DataError::CoinNotFound {
                            coin_id: coin_id.to_string(),
                        });
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after_secs = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        log::warn!("rate limited by CoinGecko, retry after {retry_after_secs}s");
                        retry_after = Some(Duration::from_secs(retry_after_secs));
                        last_error = Some(DataError::RateLimited { retry_after_secs });
                        continue;
                    }

                    if !status.is_success() {
                        last_error = Some(DataError::Other(format!("HTTP {status} for {coin_id}")));
                        continue;
                    }

                    let chart: MarketChartResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {coin_id}: {e}"
                        ))
                    })?;

                    return Self::parse_response(coin_id, chart);
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error = Some(DataError::Timeout(e.to_string()));
                        continue;
                    }
                    if e.is_connect() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "coingecko"
    }

    fn fetch(&self, coin_id: &str, vs_currency: &str, days: u32) -> Result<FetchResult, DataError> {
        log::info!("fetching {days} days of {coin_id}/{vs_currency} from CoinGecko");
        let points = self.fetch_with_retry(coin_id, vs_currency, days)?;
        Ok(FetchResult {
            coin_id: coin_id.to_string(),
            vs_currency: vs_currency.to_string(),
            points,
            source: DataSource::CoinGecko,
        })
    }
}
