//! Validated daily closing-price series for one (coin, currency) pair.
//!
//! Invariants are enforced at construction and hold for the lifetime of the
//! value: dates strictly ascending, no duplicates, every price finite and > 0.
//! The series is immutable once built.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One daily closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Errors from series construction.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("price series is empty")]
    Empty,

    #[error("non-positive or non-finite price {price} at {date}")]
    InvalidPrice { date: NaiveDate, price: f64 },

    #[error("dates not strictly ascending at {0}")]
    OutOfOrder(NaiveDate),
}

/// Chronological, duplicate-free, strictly-positive closing prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    coin_id: String,
    vs_currency: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, validating every invariant.
    ///
    /// Points must already be sorted; a duplicate or backwards date is an
    /// error here, not something we silently fix (the ingest layer owns
    /// sorting and dedup). A single point is a valid series — the simulator
    /// separately requires at least two.
    pub fn new(
        coin_id: impl Into<String>,
        vs_currency: impl Into<String>,
        points: Vec<PricePoint>,
    ) -> Result<Self, SeriesError> {
        if points.is_empty() {
            return Err(SeriesError::Empty);
        }
        for point in &points {
            if !point.price.is_finite() || point.price <= 0.0 {
                return Err(SeriesError::InvalidPrice {
                    date: point.date,
                    price: point.price,
                });
            }
        }
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::OutOfOrder(pair[1].date));
            }
        }
        Ok(Self {
            coin_id: coin_id.into(),
            vs_currency: vs_currency.into(),
            points,
        })
    }

    pub fn coin_id(&self) -> &str {
        &self.coin_id
    }

    pub fn vs_currency(&self) -> &str {
        &self.vs_currency
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.price)
    }

    /// First date in the series.
    pub fn start_date(&self) -> NaiveDate {
        self.points[0].date
    }

    /// Last date in the series.
    pub fn end_date(&self) -> NaiveDate {
        self.points[self.points.len() - 1].date
    }

    /// Most recent closing price — the anchor for simulated paths.
    pub fn last_price(&self) -> f64 {
        self.points[self.points.len() - 1].price
    }

    /// Deterministic BLAKE3 hash over dates and prices, for run manifests.
    pub fn data_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.coin_id.as_bytes());
        hasher.update(self.vs_currency.as_bytes());
        for point in &self.points {
            hasher.update(point.date.to_string().as_bytes());
            hasher.update(&point.price.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}
