//! Logarithmic daily returns derived from a price series.
//!
//! Entry `i` is `ln(price[i+1] / price[i])`, so the series is always exactly
//! one shorter than the price series it came from. Log-returns are additive
//! over time and feed the GBM simulator's drift/volatility estimates.

use super::price_series::PriceSeries;
use serde::{Deserialize, Serialize};

/// Log-return series. Derived, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    values: Vec<f64>,
}

impl ReturnSeries {
    /// Compute log-returns from consecutive prices.
    ///
    /// All prices are > 0 so every value is finite. A 1-point series yields
    /// an empty return series; the simulator rejects those before getting
    /// here.
    pub fn from_prices(series: &PriceSeries) -> Self {
        let values = series
            .points()
            .windows(2)
            .map(|pair| (pair[1].price / pair[0].price).ln())
            .collect();
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mean log-return (drift μ).
    pub fn drift(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Sample standard deviation of log-returns (volatility σ, ddof = 1).
    ///
    /// A single return has no dispersion information, so σ = 0 in that case.
    pub fn volatility(&self) -> f64 {
        let n = self.values.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.drift();
        let sum_sq: f64 = self.values.iter().map(|r| (r - mean).powi(2)).sum();
        (sum_sq / (n - 1) as f64).sqrt()
    }
}
