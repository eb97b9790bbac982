//! Investment-value projection from terminal prices.
//!
//! Each path's final value is the principal scaled by the path's price
//! ratio: `principal * final_price / starting_price`. Units scale linearly,
//! so we never simulate "shares" — just rescale the terminal distribution.

use serde::{Deserialize, Serialize};

use montelab_core::sim::{percentile, SimulationResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentProjection {
    pub principal: f64,
    pub min_value: f64,
    pub p05_value: f64,
    pub median_value: f64,
    pub p95_value: f64,
    pub max_value: f64,
    pub mean_value: f64,
    /// Paths whose final value is at or above the principal.
    pub paths_at_or_above_principal: usize,
    /// Same, as a share of all paths in [0, 1].
    pub share_at_or_above_principal: f64,
}

impl InvestmentProjection {
    pub fn from_result(result: &SimulationResult, principal: f64) -> Self {
        let scale = principal / result.starting_price;
        let mut values: Vec<f64> = result.final_prices.iter().map(|p| p * scale).collect();

        let at_or_above = values.iter().filter(|&&v| v >= principal).count();
        let mean = values.iter().sum::<f64>() / values.len() as f64;

        values.sort_by(f64::total_cmp);

        Self {
            principal,
            min_value: values[0],
            p05_value: percentile(&values, 5.0),
            median_value: percentile(&values, 50.0),
            p95_value: percentile(&values, 95.0),
            max_value: values[values.len() - 1],
            mean_value: mean,
            paths_at_or_above_principal: at_or_above,
            share_at_or_above_principal: at_or_above as f64 / values.len() as f64,
        }
    }

    /// Final value for one path's terminal price.
    pub fn value_of(principal: f64, starting_price: f64, final_price: f64) -> f64 {
        principal * final_price / starting_price
    }
}
