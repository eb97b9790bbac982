//! Per-day and terminal summaries over simulated paths.

use serde::{Deserialize, Serialize};

/// Cross-path summary of prices on a single future day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    /// Days from today; day 0 is the starting price.
    pub day: usize,
    pub min: f64,
    pub p05: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub p95: f64,
    pub max: f64,
    pub mean: f64,
}

impl DaySummary {
    /// Summarize one day's prices across all paths.
    ///
    /// `values` must be non-empty; the simulator guarantees N ≥ 1.
    pub fn from_values(day: usize, values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;

        Self {
            day,
            min: sorted[0],
            p05: percentile(&sorted, 5.0),
            p25: percentile(&sorted, 25.0),
            median: percentile(&sorted, 50.0),
            p75: percentile(&sorted, 75.0),
            p95: percentile(&sorted, 95.0),
            max: sorted[sorted.len() - 1],
            mean,
        }
    }
}

/// Summary of the day-H (terminal) price distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalDistribution {
    pub min: f64,
    pub p05: f64,
    pub median: f64,
    pub p95: f64,
    pub max: f64,
    pub mean: f64,
}

impl FinalDistribution {
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
        Self {
            min: sorted[0],
            p05: percentile(&sorted, 5.0),
            median: percentile(&sorted, 50.0),
            p95: percentile(&sorted, 95.0),
            max: sorted[sorted.len() - 1],
            mean,
        }
    }
}

/// Linear-interpolation percentile over an ascending-sorted slice.
///
/// Matches the numpy default ("linear" method). `p` is in [0, 100].
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
