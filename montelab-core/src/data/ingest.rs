//! Ingest pipeline: raw provider samples → validated `PriceSeries`.
//!
//! CoinGecko returns hourly samples for windows under 91 days and daily
//! samples above. We collapse to one closing price per calendar date by
//! keeping the LAST sample of each day, then validate the result.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::provider::{DataError, FetchResult, RawPricePoint};
use crate::domain::{PricePoint, PriceSeries};

/// Result of a successful ingest.
#[derive(Debug, Clone)]
pub struct IngestResult {
    pub series: PriceSeries,
    /// Raw samples dropped during ingest (non-finite/non-positive prices,
    /// unparseable timestamps).
    pub dropped: usize,
}

/// Run the ingest pipeline on a fetch result.
pub fn ingest(fetch: FetchResult) -> Result<IngestResult, DataError> {
    let total = fetch.points.len();

    // BTreeMap keeps dates sorted; later samples of the same day overwrite
    // earlier ones, so the entry left standing is that day's close.
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut dropped = 0usize;

    for RawPricePoint { timestamp_ms, price } in fetch.points {
        if !price.is_finite() || price <= 0.0 {
            dropped += 1;
            continue;
        }
        let Some(date) = chrono::DateTime::from_timestamp_millis(timestamp_ms)
            .map(|dt| dt.naive_utc().date())
        else {
            dropped += 1;
            continue;
        };
        by_date.insert(date, price);
    }

    let points: Vec<PricePoint> = by_date
        .into_iter()
        .map(|(date, price)| PricePoint { date, price })
        .collect();

    if points.len() < 2 {
        return Err(DataError::ValidationError(format!(
            "only {} usable daily prices after ingest (from {total} raw samples), need at least 2",
            points.len()
        )));
    }

    let series = PriceSeries::new(fetch.coin_id, fetch.vs_currency, points)
        .map_err(|e| DataError::ValidationError(e.to_string()))?;

    log::debug!(
        "ingested {} daily prices for {}/{} ({dropped} raw samples dropped)",
        series.len(),
        series.coin_id(),
        series.vs_currency(),
    );

    Ok(IngestResult { series, dropped })
}
