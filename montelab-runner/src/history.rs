//! Descriptive statistics over a historical price series.
//!
//! These feed the CLI `history` command and the manifest's history block:
//! the extremes with their dates, the average, and the span.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use montelab_core::domain::PriceSeries;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub coin_id: String,
    pub vs_currency: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub point_count: usize,
    pub min_price: f64,
    pub min_date: NaiveDate,
    pub max_price: f64,
    pub max_date: NaiveDate,
    pub mean_price: f64,
    pub last_price: f64,
}

impl HistoryStats {
    pub fn from_series(series: &PriceSeries) -> Self {
        let points = series.points();

        let mut min = &points[0];
        let mut max = &points[0];
        let mut sum = 0.0;
        for point in points {
            if point.price < min.price {
                min = point;
            }
            if point.price > max.price {
                max = point;
            }
            sum += point.price;
        }

        Self {
            coin_id: series.coin_id().to_string(),
            vs_currency: series.vs_currency().to_string(),
            start_date: series.start_date(),
            end_date: series.end_date(),
            point_count: series.len(),
            min_price: min.price,
            min_date: min.date,
            max_price: max.price,
            max_date: max.date,
            mean_price: sum / points.len() as f64,
            last_price: series.last_price(),
        }
    }
}
