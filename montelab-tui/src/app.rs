//! Application state — single-owner, main-thread only.
//!
//! All TUI state lives here. The worker thread communicates via channels.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};

use chrono::NaiveDateTime;

use montelab_core::data::DataSource;
use montelab_core::domain::PriceSeries;
use montelab_runner::{
    ConfigError, ForecastConfig, ForecastResult, ForecastSection, HistoryStats, SimulationSection,
};

use crate::sample_data;
use crate::worker::{WorkerCommand, WorkerResponse};

/// Which panel is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    History,
    Forecast,
    Distribution,
    Help,
}

impl Panel {
    pub fn index(self) -> usize {
        match self {
            Panel::History => 0,
            Panel::Forecast => 1,
            Panel::Distribution => 2,
            Panel::Help => 3,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Panel::History),
            1 => Some(Panel::Forecast),
            2 => Some(Panel::Distribution),
            3 => Some(Panel::Help),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Panel::History => "History",
            Panel::Forecast => "Forecast",
            Panel::Distribution => "Distribution",
            Panel::Help => "Help",
        }
    }

    pub fn next(self) -> Panel {
        Panel::from_index((self.index() + 1) % 4).unwrap()
    }

    pub fn prev(self) -> Panel {
        Panel::from_index((self.index() + 3) % 4).unwrap()
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An error record for the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

/// Error category for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Simulation,
    Other,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Network => "NET",
            ErrorCategory::Data => "DATA",
            ErrorCategory::Simulation => "SIM",
            ErrorCategory::Other => "ERR",
        }
    }
}

/// History panel state — the loaded series and its stats.
pub struct HistoryPanelState {
    pub series: Option<PriceSeries>,
    pub source: Option<DataSource>,
    pub stats: Option<HistoryStats>,
    pub fetch_in_progress: bool,
}

impl HistoryPanelState {
    pub fn new() -> Self {
        Self {
            series: None,
            source: None,
            stats: None,
            fetch_in_progress: false,
        }
    }

    pub fn set_series(&mut self, series: PriceSeries, source: DataSource) {
        self.stats = Some(HistoryStats::from_series(&series));
        self.series = Some(series);
        self.source = Some(source);
        self.fetch_in_progress = false;
    }
}

/// Forecast panel state — editable settings plus the latest result.
pub struct ForecastPanelState {
    pub coin: String,
    pub vs_currency: String,
    pub history_days: u32,
    pub paths: usize,
    pub horizon_days: usize,
    pub seed: Option<u64>,
    pub principal: Option<f64>,

    /// Which settings row the cursor is on.
    pub cursor: usize,
    pub running: bool,
    pub result: Option<Box<ForecastResult>>,
}

impl ForecastPanelState {
    pub fn new() -> Self {
        Self {
            coin: "bitcoin".to_string(),
            vs_currency: "usd".to_string(),
            history_days: 365,
            paths: 1000,
            horizon_days: 30,
            seed: Some(42),
            principal: None,
            cursor: 0,
            running: false,
            result: None,
        }
    }

    /// Rows: paths, horizon, seed, principal, history window.
    pub fn setting_count(&self) -> usize {
        5
    }

    /// Build and validate a config from the current settings.
    pub fn to_config(&self) -> Result<ForecastConfig, ConfigError> {
        let config = ForecastConfig {
            forecast: ForecastSection {
                coin: self.coin.trim().to_lowercase(),
                vs_currency: self.vs_currency.clone(),
                history_days: self.history_days,
            },
            simulation: SimulationSection {
                paths: self.paths,
                horizon_days: self.horizon_days,
                seed: self.seed,
                principal: self.principal,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    Welcome,
    CoinInput,
    ErrorHistory,
}

/// Top-level application state.
pub struct AppState {
    // Navigation
    pub active_panel: Panel,
    pub running: bool,

    // Panel states
    pub history: HistoryPanelState,
    pub forecast: ForecastPanelState,

    // Worker communication
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,

    // Cross-cutting
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub overlay: Overlay,
    pub coin_input: String,

    // Paths
    pub cache_dir: PathBuf,
}

impl AppState {
    pub fn new(
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
        cache_dir: PathBuf,
    ) -> Self {
        Self {
            active_panel: Panel::History,
            running: true,
            history: HistoryPanelState::new(),
            forecast: ForecastPanelState::new(),
            worker_tx,
            worker_rx,
            status_message: None,
            error_history: VecDeque::with_capacity(50),
            error_scroll: 0,
            overlay: Overlay::Welcome,
            coin_input: String::new(),
            cache_dir,
        }
    }

    /// Push an error to the history, capping at 50.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > 50 {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    /// Set an info status message.
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    /// Set a warning status message.
    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    /// Load the built-in sample series into the history panel.
    pub fn load_sample(&mut self) {
        let series = sample_data::sample_series();
        self.forecast.coin = series.coin_id().to_string();
        self.forecast.vs_currency = series.vs_currency().to_string();
        self.history.set_series(series, DataSource::Sample);
        self.set_status("Loaded built-in sample series");
    }
}
