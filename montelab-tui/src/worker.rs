//! Background worker thread — network fetches and simulations run here.
//!
//! Communication with the TUI main thread is via `mpsc` channels.
//! The worker runs simulations on a private rayon::ThreadPool so the
//! global pool stays free for anything else.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use montelab_core::data::{CoinGeckoProvider, DataSource, ParquetCache, PriceProvider};
use montelab_core::domain::PriceSeries;
use montelab_runner::{
    load_series, run_forecast_from_series, ForecastConfig, ForecastResult, LoadOptions,
};

/// Commands sent from the TUI to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    FetchHistory {
        coin: String,
        vs_currency: String,
        days: u32,
        force: bool,
        cache_dir: PathBuf,
    },
    RunForecast {
        config: ForecastConfig,
        series: Box<PriceSeries>,
        source: DataSource,
    },
    Shutdown,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug)]
pub enum WorkerResponse {
    HistoryLoaded {
        series: Box<PriceSeries>,
        source: DataSource,
    },
    HistoryError {
        coin: String,
        error: String,
    },
    ForecastComplete {
        result: Box<ForecastResult>,
    },
    ForecastError {
        error: String,
    },
}

/// Spawn the background worker thread.
pub fn spawn_worker(rx: Receiver<WorkerCommand>, tx: Sender<WorkerResponse>) -> JoinHandle<()> {
    thread::Builder::new()
        .name("montelab-worker".into())
        .spawn(move || {
            worker_loop(rx, tx);
        })
        .expect("failed to spawn worker thread")
}

fn worker_loop(rx: Receiver<WorkerCommand>, tx: Sender<WorkerResponse>) {
    // Private rayon pool so simulations never contend with the global one.
    let pool = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("montelab-pool-{i}"))
        .build()
        .expect("failed to build worker rayon pool");

    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(cmd) => handle_command(cmd, &tx, &pool),
        }
    }
}

fn handle_command(cmd: WorkerCommand, tx: &Sender<WorkerResponse>, pool: &rayon::ThreadPool) {
    match cmd {
        WorkerCommand::FetchHistory {
            coin,
            vs_currency,
            days,
            force,
            cache_dir,
        } => {
            handle_fetch(&coin, &vs_currency, days, force, &cache_dir, tx);
        }
        WorkerCommand::RunForecast {
            config,
            series,
            source,
        } => {
            let outcome =
                pool.install(|| run_forecast_from_series(&config, &series, source));
            match outcome {
                Ok(result) => {
                    let _ = tx.send(WorkerResponse::ForecastComplete {
                        result: Box::new(result),
                    });
                }
                Err(e) => {
                    let _ = tx.send(WorkerResponse::ForecastError {
                        error: e.to_string(),
                    });
                }
            }
        }
        WorkerCommand::Shutdown => {} // handled in loop
    }
}

fn handle_fetch(
    coin: &str,
    vs_currency: &str,
    days: u32,
    force: bool,
    cache_dir: &PathBuf,
    tx: &Sender<WorkerResponse>,
) {
    let cache = ParquetCache::new(cache_dir);
    let provider = CoinGeckoProvider::new();
    let opts = LoadOptions {
        days,
        offline: false,
        force,
    };

    match load_series(coin, vs_currency, &cache, Some(&provider as &dyn PriceProvider), &opts) {
        Ok(loaded) => {
            let _ = tx.send(WorkerResponse::HistoryLoaded {
                series: Box::new(loaded.series),
                source: loaded.source,
            });
        }
        Err(e) => {
            let _ = tx.send(WorkerResponse::HistoryError {
                coin: coin.to_string(),
                error: e.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn worker_shutdown() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, _resp_rx) = mpsc::channel();

        let handle = spawn_worker(cmd_rx, resp_tx);
        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().expect("worker should join cleanly");
    }

    #[test]
    fn worker_runs_forecast_from_series() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();

        let handle = spawn_worker(cmd_rx, resp_tx);

        let series = crate::sample_data::sample_series();
        let config = ForecastConfig {
            forecast: montelab_runner::ForecastSection {
                coin: series.coin_id().to_string(),
                vs_currency: series.vs_currency().to_string(),
                history_days: 180,
            },
            simulation: montelab_runner::SimulationSection {
                paths: 100,
                horizon_days: 10,
                seed: Some(7),
                principal: None,
            },
        };

        cmd_tx
            .send(WorkerCommand::RunForecast {
                config,
                series: Box::new(series),
                source: DataSource::Sample,
            })
            .unwrap();

        match resp_rx
            .recv_timeout(std::time::Duration::from_secs(30))
            .unwrap()
        {
            WorkerResponse::ForecastComplete { result } => {
                assert_eq!(result.simulation.num_paths, 100);
                assert_eq!(result.simulation.days.len(), 11);
            }
            other => panic!("unexpected response: {other:?}"),
        }

        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn worker_uses_private_pool() {
        // The global rayon pool thread count should not change after spawning our worker
        let global_threads = rayon::current_num_threads();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, _resp_rx) = mpsc::channel();

        let handle = spawn_worker(cmd_rx, resp_tx);
        assert_eq!(rayon::current_num_threads(), global_threads);

        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }
}
