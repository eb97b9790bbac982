//! Geometric-Brownian-motion path generator.
//!
//! Model: daily log-returns are drawn i.i.d. from N(μ, σ), where μ is the
//! mean and σ the sample standard deviation (ddof = 1) of the historical
//! log-returns. Drawn values ARE the log-returns — no −σ²/2 variance
//! correction is applied. Each day's price is the previous day's price times
//! `exp(log_return)`, so every simulated price is strictly positive and every
//! path is anchored at the last observed price on day 0.
//!
//! Paths are independent and fan out across rayon. Per-path RNGs come from
//! hash-derived sub-seeds, so output is bit-identical to a sequential run.

use rand::Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{PriceSeries, ReturnSeries};
use crate::rng::RngHierarchy;

use super::config::{SimulationConfig, SimulationError};
use super::summary::{DaySummary, FinalDistribution};

/// Complete result of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub num_paths: usize,
    pub horizon_days: usize,
    /// Seed actually used — either the caller's or one drawn from entropy.
    pub master_seed: u64,
    /// Last observed price; day 0 of every path.
    pub starting_price: f64,
    /// Drift μ estimated from the historical log-returns.
    pub drift: f64,
    /// Volatility σ estimated from the historical log-returns (ddof = 1).
    pub volatility: f64,
    /// Per-day cross-path summaries for days `0..=horizon_days`.
    pub days: Vec<DaySummary>,
    /// Terminal prices in path order (path `i` → `final_prices[i]`).
    pub final_prices: Vec<f64>,
    /// Summary of the terminal distribution.
    pub final_distribution: FinalDistribution,
    /// Full `[path][day]` matrix, kept only when `retain_paths` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<Vec<f64>>>,
}

/// Run the Monte Carlo simulation.
///
/// Pure and single-pass: bounded by N×(H+1) price evaluations, no I/O.
/// With a fixed seed the result is exactly reproducible across runs and
/// thread counts.
pub fn simulate(
    series: &PriceSeries,
    config: &SimulationConfig,
) -> Result<SimulationResult, SimulationError> {
    config.validate()?;
    if series.len() < 2 {
        return Err(SimulationError::InsufficientData {
            points: series.len(),
        });
    }

    let returns = ReturnSeries::from_prices(series);
    let drift = returns.drift();
    let volatility = returns.volatility();
    let starting_price = series.last_price();

    let hierarchy = match config.seed {
        Some(seed) => RngHierarchy::new(seed),
        None => RngHierarchy::from_entropy(),
    };

    log::debug!(
        "simulating {} paths over {} days (seed {}, mu {:.6}, sigma {:.6})",
        config.num_paths,
        config.horizon_days,
        hierarchy.master_seed(),
        drift,
        volatility,
    );

    let paths: Vec<Vec<f64>> = (0..config.num_paths as u64)
        .into_par_iter()
        .map(|path_index| {
            generate_path(
                &hierarchy,
                path_index,
                starting_price,
                drift,
                volatility,
                config.horizon_days,
            )
        })
        .collect();

    // Aggregate across paths per day, day 0 included.
    let days: Vec<DaySummary> = (0..=config.horizon_days)
        .map(|day| {
            let values: Vec<f64> = paths.iter().map(|path| path[day]).collect();
            DaySummary::from_values(day, &values)
        })
        .collect();

    let final_prices: Vec<f64> = paths
        .iter()
        .map(|path| path[config.horizon_days])
        .collect();
    let final_distribution = FinalDistribution::from_values(&final_prices);

    Ok(SimulationResult {
        num_paths: config.num_paths,
        horizon_days: config.horizon_days,
        master_seed: hierarchy.master_seed(),
        starting_price,
        drift,
        volatility,
        days,
        final_prices,
        final_distribution,
        paths: config.retain_paths.then_some(paths),
    })
}

/// Generate one path of `horizon + 1` prices, day 0 = starting price.
fn generate_path(
    hierarchy: &RngHierarchy,
    path_index: u64,
    starting_price: f64,
    drift: f64,
    volatility: f64,
    horizon: usize,
) -> Vec<f64> {
    let mut rng = hierarchy.rng_for_path(path_index);
    let mut path = Vec::with_capacity(horizon + 1);
    let mut price = starting_price;
    path.push(price);

    for _ in 0..horizon {
        let z: f64 = rng.sample(StandardNormal);
        let log_return = drift + volatility * z;
        price *= log_return.exp();
        path.push(price);
    }

    path
}
