//! Artifact export: one directory per run id.
//!
//! Layout:
//! ```text
//! {output_dir}/{run_id}/
//!   manifest.json       full ForecastResult
//!   bands.csv           per-day percentile bands
//!   final_values.csv    terminal price (and value) per path
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::investment::InvestmentProjection;
use crate::runner::ForecastResult;

/// Where a run's artifacts landed.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub run_dir: PathBuf,
    pub manifest: PathBuf,
    pub bands_csv: PathBuf,
    pub final_values_csv: PathBuf,
}

/// Write all artifacts for a forecast run.
///
/// Re-running the same config overwrites the same directory, so the latest
/// artifacts for a config are always at a stable path.
pub fn save_artifacts(result: &ForecastResult, output_dir: &Path) -> anyhow::Result<ArtifactPaths> {
    let run_dir = output_dir.join(&result.run_id);
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create run directory {}", run_dir.display()))?;

    let manifest = run_dir.join("manifest.json");
    let json = serde_json::to_string_pretty(result).context("manifest serialization")?;
    fs::write(&manifest, json)
        .with_context(|| format!("failed to write {}", manifest.display()))?;

    let bands_csv = run_dir.join("bands.csv");
    write_bands_csv(result, &bands_csv)?;

    let final_values_csv = run_dir.join("final_values.csv");
    write_final_values_csv(result, &final_values_csv)?;

    log::info!("artifacts written to {}", run_dir.display());

    Ok(ArtifactPaths {
        run_dir,
        manifest,
        bands_csv,
        final_values_csv,
    })
}

fn write_bands_csv(result: &ForecastResult, path: &Path) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record(["day", "min", "p05", "p25", "median", "p75", "p95", "max", "mean"])?;
    for day in &result.simulation.days {
        writer.write_record([
            day.day.to_string(),
            day.min.to_string(),
            day.p05.to_string(),
            day.p25.to_string(),
            day.median.to_string(),
            day.p75.to_string(),
            day.p95.to_string(),
            day.max.to_string(),
            day.mean.to_string(),
        ])?;
    }
    writer.flush().context("flushing bands.csv")?;
    Ok(())
}

fn write_final_values_csv(result: &ForecastResult, path: &Path) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let principal = result.investment.as_ref().map(|inv| inv.principal);

    if principal.is_some() {
        writer.write_record(["path", "final_price", "final_value"])?;
    } else {
        writer.write_record(["path", "final_price"])?;
    }

    for (i, &price) in result.simulation.final_prices.iter().enumerate() {
        match principal {
            Some(p) => {
                let value =
                    InvestmentProjection::value_of(p, result.simulation.starting_price, price);
                writer.write_record([i.to_string(), price.to_string(), value.to_string()])?;
            }
            None => writer.write_record([i.to_string(), price.to_string()])?,
        }
    }
    writer.flush().context("flushing final_values.csv")?;
    Ok(())
}
