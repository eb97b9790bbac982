//! MonteLab CLI — download, forecast, history, and cache commands.
//!
//! Commands:
//! - `download` — fetch daily prices from CoinGecko and cache as Parquet
//! - `run` — run a Monte Carlo forecast from a TOML config or flags
//! - `history` — print descriptive stats for a coin's cached history
//! - `cache status` — report cache size, coins, date ranges
//! - `cache clean` — remove coins not refreshed recently

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use montelab_core::data::{
    download_coins, CoinGeckoProvider, DataSource, ParquetCache, PriceProvider, StdoutProgress,
};
use montelab_runner::{
    run_forecast, save_artifacts, ForecastConfig, ForecastResult, HistoryStats, LoadOptions,
};

#[derive(Parser)]
#[command(
    name = "montelab",
    about = "MonteLab CLI — Monte Carlo crypto price forecasting"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily prices from CoinGecko and cache as Parquet.
    Download {
        /// CoinGecko coin ids (e.g., bitcoin ethereum solana).
        #[arg(required = true)]
        coins: Vec<String>,

        /// Quote currency.
        #[arg(long, default_value = "usd")]
        vs: String,

        /// Trailing window of history, in days.
        #[arg(long, default_value_t = 365)]
        days: u32,

        /// Force re-download even if cached.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Run a Monte Carlo forecast from a TOML config file or flags.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// CoinGecko coin id (alternative to --config).
        #[arg(long)]
        coin: Option<String>,

        /// Number of Monte Carlo paths.
        #[arg(long, default_value_t = 1000)]
        paths: usize,

        /// Forecast horizon in days.
        #[arg(long, default_value_t = 30)]
        horizon: usize,

        /// Master seed for reproducible runs.
        #[arg(long)]
        seed: Option<u64>,

        /// Initial investment; enables the final-value projection.
        #[arg(long)]
        principal: Option<f64>,

        /// Trailing window of history, in days.
        #[arg(long, default_value_t = 365)]
        days: u32,

        /// Quote currency.
        #[arg(long, default_value = "usd")]
        vs: String,

        /// Offline mode: no network access, cache only.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Print descriptive stats for a coin's price history.
    History {
        /// CoinGecko coin id.
        coin: String,

        /// Quote currency.
        #[arg(long, default_value = "usd")]
        vs: String,

        /// Trailing window of history, in days.
        #[arg(long, default_value_t = 365)]
        days: u32,

        /// Offline mode: no network access, cache only.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report cache size, coin count, and date ranges.
    Status {
        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Remove cached coins not refreshed within the given number of days.
    Clean {
        /// Remove coins not refreshed in this many days.
        #[arg(long)]
        unused_days: u64,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,

        /// Actually delete (without this flag, only previews what would be removed).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Download {
            coins,
            vs,
            days,
            force,
            cache_dir,
        } => run_download(coins, &vs, days, force, cache_dir),
        Commands::Run {
            config,
            coin,
            paths,
            horizon,
            seed,
            principal,
            days,
            vs,
            offline,
            cache_dir,
            output_dir,
        } => run_forecast_cmd(
            config, coin, paths, horizon, seed, principal, days, &vs, offline, cache_dir,
            output_dir,
        ),
        Commands::History {
            coin,
            vs,
            days,
            offline,
            cache_dir,
        } => run_history(&coin, &vs, days, offline, cache_dir),
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir } => run_cache_status(&cache_dir),
            CacheAction::Clean {
                unused_days,
                cache_dir,
                confirm,
            } => run_cache_clean(&cache_dir, unused_days, confirm),
        },
    }
}

/// Route `log` records from the library crates through tracing, with
/// RUST_LOG-style filtering (defaults to info).
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_log::LogTracer::init();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run_download(
    coins: Vec<String>,
    vs: &str,
    days: u32,
    force: bool,
    cache_dir: PathBuf,
) -> Result<()> {
    let provider = CoinGeckoProvider::new();
    let cache = ParquetCache::new(cache_dir);
    let progress = StdoutProgress;

    let coins: Vec<String> = coins.iter().map(|c| c.trim().to_lowercase()).collect();
    let coin_refs: Vec<&str> = coins.iter().map(|c| c.as_str()).collect();

    let summary = download_coins(&provider, &cache, &coin_refs, vs, days, force, &progress);

    if !summary.all_succeeded() {
        for (coin, err) in &summary.errors {
            eprintln!("Error for {coin}: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_forecast_cmd(
    config_path: Option<PathBuf>,
    coin: Option<String>,
    paths: usize,
    horizon: usize,
    seed: Option<u64>,
    principal: Option<f64>,
    days: u32,
    vs: &str,
    offline: bool,
    cache_dir: PathBuf,
    output_dir: PathBuf,
) -> Result<()> {
    // Validate mutually exclusive options
    if config_path.is_some() && coin.is_some() {
        bail!("--config and --coin are mutually exclusive");
    }
    if config_path.is_none() && coin.is_none() {
        bail!("one of --config or --coin is required");
    }

    let config = if let Some(path) = config_path {
        ForecastConfig::from_file(&path)?
    } else {
        build_config_from_flags(&coin.unwrap(), vs, days, paths, horizon, seed, principal)?
    };

    let opts = LoadOptions {
        days: config.forecast.history_days,
        offline,
        force: false,
    };

    let cache = ParquetCache::new(&cache_dir);
    let provider = CoinGeckoProvider::new();
    let provider_ref: Option<&dyn PriceProvider> = if offline { None } else { Some(&provider) };

    let result = run_forecast(&config, &cache, provider_ref, &opts)?;

    print_summary(&result);

    let artifacts = save_artifacts(&result, &output_dir)?;
    println!("Artifacts saved to: {}", artifacts.run_dir.display());

    Ok(())
}

/// Build a config from flags by formatting a TOML string and parsing it, so
/// flags go through the same validation path as config files.
fn build_config_from_flags(
    coin: &str,
    vs: &str,
    days: u32,
    paths: usize,
    horizon: usize,
    seed: Option<u64>,
    principal: Option<f64>,
) -> Result<ForecastConfig> {
    let mut toml_str = format!(
        r#"[forecast]
coin = "{coin}"
vs_currency = "{vs}"
history_days = {days}

[simulation]
paths = {paths}
horizon_days = {horizon}
"#
    );
    if let Some(seed) = seed {
        toml_str.push_str(&format!("seed = {seed}\n"));
    }
    if let Some(principal) = principal {
        toml_str.push_str(&format!("principal = {principal}\n"));
    }

    Ok(ForecastConfig::from_toml(&toml_str)?)
}

fn run_history(coin: &str, vs: &str, days: u32, offline: bool, cache_dir: PathBuf) -> Result<()> {
    let cache = ParquetCache::new(cache_dir);
    let provider = CoinGeckoProvider::new();
    let provider_ref: Option<&dyn PriceProvider> = if offline { None } else { Some(&provider) };

    let opts = LoadOptions {
        days,
        offline,
        force: false,
    };
    let coin = coin.trim().to_lowercase();
    let loaded = montelab_runner::load_series(&coin, vs, &cache, provider_ref, &opts)?;
    let stats = HistoryStats::from_series(&loaded.series);

    println!();
    println!("=== Price History: {}/{} ===", stats.coin_id, stats.vs_currency);
    println!("Period:      {} to {}", stats.start_date, stats.end_date);
    println!("Points:      {}", stats.point_count);
    println!("Low:         {:.2} on {}", stats.min_price, stats.min_date);
    println!("High:        {:.2} on {}", stats.max_price, stats.max_date);
    println!("Average:     {:.2}", stats.mean_price);
    println!("Last:        {:.2}", stats.last_price);
    if loaded.source == DataSource::Cache {
        println!("Source:      cache");
    }
    println!();

    Ok(())
}

fn run_cache_status(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let mut total_size: u64 = 0;
    let mut pair_count = 0;
    let mut rows: Vec<(String, String, String, u64)> = Vec::new();

    for coin_entry in std::fs::read_dir(cache_dir)? {
        let coin_entry = coin_entry?;
        let coin_name = coin_entry.file_name().to_string_lossy().to_string();
        if !coin_name.starts_with("coin=") {
            continue;
        }
        let coin = coin_name.trim_start_matches("coin=").to_string();

        for vs_entry in std::fs::read_dir(coin_entry.path())? {
            let vs_entry = vs_entry?;
            let vs_name = vs_entry.file_name().to_string_lossy().to_string();
            if !vs_name.starts_with("vs=") {
                continue;
            }
            let vs = vs_name.trim_start_matches("vs=").to_string();
            pair_count += 1;

            let meta_path = vs_entry.path().join("meta.json");
            let (date_range, points) = if let Ok(content) = std::fs::read_to_string(&meta_path) {
                if let Ok(meta) =
                    serde_json::from_str::<montelab_core::data::CacheMeta>(&content)
                {
                    (
                        format!("{} to {}", meta.start_date, meta.end_date),
                        format!("{} days", meta.point_count),
                    )
                } else {
                    ("(corrupt meta)".into(), "-".into())
                }
            } else {
                ("(no meta)".into(), "-".into())
            };

            let size = dir_size(&vs_entry.path());
            total_size += size;

            rows.push((format!("{coin}/{vs}"), date_range, points, size));
        }
    }

    if pair_count == 0 {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }

    rows.sort_by(|a, b| a.0.cmp(&b.0));

    println!("Cache: {}", cache_dir.display());
    println!("Pairs: {pair_count}");
    println!("Total size: {}", format_size(total_size));
    println!();
    println!("{:<20} {:<25} {:<12} {:>10}", "Pair", "Date Range", "Points", "Size");
    println!("{}", "-".repeat(70));
    for (pair, range, points, size) in &rows {
        println!("{:<20} {:<25} {:<12} {:>10}", pair, range, points, format_size(*size));
    }

    Ok(())
}

fn run_cache_clean(cache_dir: &Path, unused_days: u64, confirm: bool) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cutoff = chrono::Local::now().naive_local() - chrono::Duration::days(unused_days as i64);

    let mut to_remove: Vec<(String, PathBuf)> = Vec::new();

    for coin_entry in std::fs::read_dir(cache_dir)? {
        let coin_entry = coin_entry?;
        let coin_name = coin_entry.file_name().to_string_lossy().to_string();
        if !coin_name.starts_with("coin=") {
            continue;
        }
        let coin = coin_name.trim_start_matches("coin=").to_string();

        // A coin is stale only if every currency pair under it is stale.
        let mut all_stale = true;
        let mut any_meta = false;

        for vs_entry in std::fs::read_dir(coin_entry.path())? {
            let vs_entry = vs_entry?;
            let meta_path = vs_entry.path().join("meta.json");
            if let Ok(content) = std::fs::read_to_string(&meta_path) {
                if let Ok(meta) =
                    serde_json::from_str::<montelab_core::data::CacheMeta>(&content)
                {
                    any_meta = true;
                    if meta.cached_at >= cutoff {
                        all_stale = false;
                    }
                    continue;
                }
            }
            // Unreadable metadata: keep the pair rather than guessing.
            all_stale = false;
        }

        if any_meta && all_stale {
            to_remove.push((coin, coin_entry.path()));
        }
    }

    if to_remove.is_empty() {
        println!("No coins older than {unused_days} days to remove.");
        return Ok(());
    }

    println!(
        "Found {} coin(s) not refreshed in {unused_days} days:",
        to_remove.len()
    );
    for (coin, path) in &to_remove {
        let size = dir_size(path);
        println!("  {coin} ({})", format_size(size));
    }

    if !confirm {
        println!();
        println!("Dry run — pass --confirm to actually delete.");
        return Ok(());
    }

    for (coin, path) in &to_remove {
        std::fs::remove_dir_all(path)?;
        println!("Removed: {coin}");
    }

    println!("Done. Removed {} coin(s).", to_remove.len());
    Ok(())
}

fn dir_size(path: &Path) -> u64 {
    let mut size = 0u64;
    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            if let Ok(meta) = entry.metadata() {
                if meta.is_dir() {
                    size += dir_size(&entry.path());
                } else {
                    size += meta.len();
                }
            }
        }
    }
    size
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn print_summary(result: &ForecastResult) {
    let sim = &result.simulation;
    let dist = &sim.final_distribution;

    println!();
    println!("=== Forecast Result ===");
    println!(
        "Coin:           {}/{}",
        result.config.forecast.coin, result.config.forecast.vs_currency
    );
    println!(
        "History:        {} to {} ({} points)",
        result.history.start_date, result.history.end_date, result.history.point_count
    );
    println!("Starting price: {:.2}", sim.starting_price);
    println!(
        "Paths:          {} over {} days",
        sim.num_paths, sim.horizon_days
    );
    println!("Seed:           {}", sim.master_seed);
    println!(
        "Drift/Vol:      {:.6} / {:.6} (daily log-returns)",
        sim.drift, sim.volatility
    );
    println!();
    println!("--- Day {} price distribution ---", sim.horizon_days);
    println!("Min:            {:.2}", dist.min);
    println!("5th pct:        {:.2}", dist.p05);
    println!("Median:         {:.2}", dist.median);
    println!("95th pct:       {:.2}", dist.p95);
    println!("Max:            {:.2}", dist.max);
    println!("Mean:           {:.2}", dist.mean);

    if let Some(inv) = &result.investment {
        println!();
        println!("--- Investment of {:.2} ---", inv.principal);
        println!("Min value:      {:.2}", inv.min_value);
        println!("Median value:   {:.2}", inv.median_value);
        println!("Max value:      {:.2}", inv.max_value);
        println!(
            "At/above start: {} of {} paths ({:.1}%)",
            inv.paths_at_or_above_principal,
            sim.num_paths,
            inv.share_at_or_above_principal * 100.0
        );
    }

    if result.data_source == DataSource::Cache {
        println!();
        println!("NOTE: history served from cache");
    }
    println!();
}
