//! Built-in sample price series for offline exploration.
//!
//! Lets the TUI demo every panel without network access or a warm cache.
//! The generator is a deterministic LCG-driven random walk, so the sample
//! series is identical on every launch.

use chrono::{Duration, NaiveDate};

use montelab_core::domain::{PricePoint, PriceSeries};

/// A 180-day sample series resembling a mid-cap coin.
pub fn sample_series() -> PriceSeries {
    build_series("sample-coin", "usd", 180, 250.0, 0.0008, 0.025, 42)
}

/// Deterministic random-walk series.
///
/// LCG noise in [-1, 1]; daily return = drift + volatility * noise. Prices
/// are floored at 1% of the start so the series stays valid.
fn build_series(
    coin_id: &str,
    vs_currency: &str,
    days: i64,
    start_price: f64,
    drift: f64,
    volatility: f64,
    seed: u64,
) -> PriceSeries {
    let end = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
    let start_date = end - Duration::days(days - 1);

    let mut price = start_price;
    let mut rng_state = seed;
    let mut points = Vec::with_capacity(days as usize);

    for offset in 0..days {
        points.push(PricePoint {
            date: start_date + Duration::days(offset),
            price,
        });

        rng_state = rng_state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let noise = ((rng_state >> 33) as f64) / (u32::MAX as f64) * 2.0 - 1.0;

        price *= 1.0 + drift + volatility * noise;
        price = price.max(start_price * 0.01);
    }

    PriceSeries::new(coin_id, vs_currency, points).expect("sample series is always valid")
}
