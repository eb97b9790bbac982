//! Domain types: price points, validated price series, log-return series.

pub mod price_series;
pub mod returns;

pub use price_series::{PricePoint, PriceSeries, SeriesError};
pub use returns::ReturnSeries;
