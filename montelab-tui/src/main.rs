//! MonteLab TUI — four-panel terminal interface with vim-style navigation.
//!
//! Panels:
//! 1. History — price history fetching, chart, stats
//! 2. Forecast — simulation settings and percentile fan chart
//! 3. Distribution — final-price histogram and investment projection
//! 4. Help — keyboard shortcuts and documentation

mod app;
mod input;
mod sample_data;
mod theme;
mod ui;
mod worker;

use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::app::{AppState, ErrorCategory};
use crate::worker::{WorkerCommand, WorkerResponse};

fn main() -> Result<()> {
    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    // Cache lives in the per-user data dir; falls back to ./data.
    let cache_dir = dirs::data_local_dir()
        .map(|d| d.join("montelab"))
        .unwrap_or_else(|| PathBuf::from("data"));

    // Worker channels
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();

    // Spawn worker
    let worker_handle = worker::spawn_worker(cmd_rx, resp_tx);

    // Build app state
    let mut app = AppState::new(cmd_tx.clone(), resp_rx, cache_dir);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the main event loop
    let result = run_app(&mut terminal, &mut app);

    // Shutdown worker
    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    let _ = worker_handle.join();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Drain worker responses (non-blocking)
        while let Ok(resp) = app.worker_rx.try_recv() {
            handle_worker_response(app, resp);
        }

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 4. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}

fn handle_worker_response(app: &mut AppState, resp: WorkerResponse) {
    match resp {
        WorkerResponse::HistoryLoaded { series, source } => {
            let coin = series.coin_id().to_string();
            let points = series.len();
            app.history.set_series(*series, source);
            app.set_status(format!("Loaded {points} days of {coin} ({source:?})"));
        }
        WorkerResponse::HistoryError { coin, error } => {
            app.history.fetch_in_progress = false;
            app.push_error(
                ErrorCategory::Network,
                format!("Failed to load history: {error}"),
                coin,
            );
        }
        WorkerResponse::ForecastComplete { result } => {
            app.forecast.running = false;
            app.set_status(format!(
                "Forecast complete: {} paths, {} days, seed {}",
                result.simulation.num_paths,
                result.simulation.horizon_days,
                result.simulation.master_seed,
            ));
            app.forecast.result = Some(result);
        }
        WorkerResponse::ForecastError { error } => {
            app.forecast.running = false;
            app.push_error(ErrorCategory::Simulation, error, "forecast run".into());
        }
    }
}
