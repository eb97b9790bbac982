//! Keyboard input dispatch — global keys → overlays → panel-specific handlers.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{AppState, Overlay, Panel};
use crate::worker::WorkerCommand;

/// Handle a key event.
pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Overlays consume input first.
    match &app.overlay {
        Overlay::Welcome => {
            app.overlay = Overlay::None;
            return;
        }
        Overlay::ErrorHistory => {
            handle_error_overlay(app, key);
            return;
        }
        Overlay::CoinInput => {
            handle_coin_input_overlay(app, key);
            return;
        }
        Overlay::None => {}
    }

    // 2. Global keys (always available).
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char('1') => { app.active_panel = Panel::History; return; }
        KeyCode::Char('2') => { app.active_panel = Panel::Forecast; return; }
        KeyCode::Char('3') => { app.active_panel = Panel::Distribution; return; }
        KeyCode::Char('4') => { app.active_panel = Panel::Help; return; }
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.active_panel = app.active_panel.prev();
            } else {
                app.active_panel = app.active_panel.next();
            }
            return;
        }
        KeyCode::BackTab => {
            app.active_panel = app.active_panel.prev();
            return;
        }
        _ => {}
    }

    // 3. Panel-specific keys.
    match app.active_panel {
        Panel::History => handle_history_key(app, key),
        Panel::Forecast => handle_forecast_key(app, key),
        Panel::Distribution => {} // display only
        Panel::Help => handle_help_key(app, key),
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

fn handle_coin_input_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.overlay = Overlay::None;
            app.coin_input.clear();
        }
        KeyCode::Enter => {
            let coin = app.coin_input.trim().to_lowercase();
            if !coin.is_empty() {
                app.forecast.coin = coin.clone();
                app.set_status(format!("Coin set to {coin} — press f in History to fetch"));
            }
            app.coin_input.clear();
            app.overlay = Overlay::None;
        }
        KeyCode::Backspace => {
            app.coin_input.pop();
        }
        KeyCode::Char(c) => {
            app.coin_input.push(c);
        }
        _ => {}
    }
}

fn handle_history_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('f') => start_fetch(app, false),
        KeyCode::Char('r') => start_fetch(app, true),
        KeyCode::Char('c') => {
            app.overlay = Overlay::CoinInput;
            app.coin_input.clear();
        }
        KeyCode::Char('s') => {
            app.load_sample();
        }
        _ => {}
    }
}

fn start_fetch(app: &mut AppState, force: bool) {
    if app.history.fetch_in_progress {
        app.set_warning("Fetch already in progress");
        return;
    }
    let coin = app.forecast.coin.trim().to_lowercase();
    if coin.is_empty() {
        app.set_warning("Set a coin first (press c)");
        return;
    }
    app.history.fetch_in_progress = true;
    let _ = app.worker_tx.send(WorkerCommand::FetchHistory {
        coin: coin.clone(),
        vs_currency: app.forecast.vs_currency.clone(),
        days: app.forecast.history_days,
        force,
        cache_dir: app.cache_dir.clone(),
    });
    app.set_status(format!("Fetching {coin}..."));
}

fn handle_forecast_key(app: &mut AppState, key: KeyEvent) {
    let setting_count = app.forecast.setting_count();

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            if app.forecast.cursor + 1 < setting_count {
                app.forecast.cursor += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.forecast.cursor = app.forecast.cursor.saturating_sub(1);
        }
        KeyCode::Char('h') | KeyCode::Left => {
            adjust_setting(app, -1);
        }
        KeyCode::Char('l') | KeyCode::Right => {
            adjust_setting(app, 1);
        }
        KeyCode::Backspace | KeyCode::Delete => {
            clear_setting(app);
        }
        KeyCode::Enter => {
            launch_forecast(app);
        }
        _ => {}
    }
}

/// Step the setting under the cursor.
fn adjust_setting(app: &mut AppState, direction: i64) {
    let f = &mut app.forecast;
    match f.cursor {
        0 => {
            let next = f.paths as i64 + direction * 100;
            f.paths = next.clamp(100, 1_000_000) as usize;
        }
        1 => {
            let next = f.horizon_days as i64 + direction * 5;
            f.horizon_days = next.clamp(1, 3650) as usize;
        }
        2 => {
            let current = f.seed.unwrap_or(0) as i64 + direction;
            f.seed = Some(current.max(0) as u64);
        }
        3 => {
            let current = f.principal.unwrap_or(0.0) + 100.0 * direction as f64;
            f.principal = if current <= 0.0 { None } else { Some(current) };
        }
        4 => {
            let next = f.history_days as i64 + direction * 30;
            f.history_days = next.clamp(30, 3650) as u32;
        }
        _ => {}
    }
}

/// Clear optional settings (seed → entropy, principal → no projection).
fn clear_setting(app: &mut AppState) {
    match app.forecast.cursor {
        2 => {
            app.forecast.seed = None;
            app.set_status("Seed cleared — next run draws from entropy");
        }
        3 => {
            app.forecast.principal = None;
            app.set_status("Principal cleared — no investment projection");
        }
        _ => {}
    }
}

fn launch_forecast(app: &mut AppState) {
    if app.forecast.running {
        app.set_warning("Forecast already running");
        return;
    }
    let Some(series) = app.history.series.clone() else {
        app.set_warning("Load history first (panel 1: f to fetch, s for sample)");
        return;
    };
    let source = app.history.source.unwrap_or(montelab_core::data::DataSource::Cache);

    // Settings coin may have changed since the series was loaded; forecast
    // what is actually on screen.
    let coin_matches = series.coin_id() == app.forecast.coin;

    match app.forecast.to_config() {
        Ok(mut config) => {
            if !coin_matches {
                config.forecast.coin = series.coin_id().to_string();
                app.set_warning(format!(
                    "Forecasting loaded series {} (fetch {} first to switch)",
                    series.coin_id(),
                    app.forecast.coin
                ));
            } else {
                app.set_status(format!(
                    "Simulating {} paths over {} days...",
                    config.simulation.paths, config.simulation.horizon_days
                ));
            }
            app.forecast.running = true;
            let _ = app.worker_tx.send(WorkerCommand::RunForecast {
                config,
                series: Box::new(series),
                source,
            });
        }
        Err(e) => {
            app.set_warning(format!("Invalid settings: {e}"));
        }
    }
}

fn handle_help_key(app: &mut AppState, key: KeyEvent) {
    if let KeyCode::Char('e') = key.code {
        app.overlay = Overlay::ErrorHistory;
        app.error_scroll = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::mpsc;

    fn test_app() -> (AppState, mpsc::Receiver<WorkerCommand>) {
        let (tx, cmd_rx) = mpsc::channel();
        let (_tx2, rx2) = mpsc::channel();
        let mut app = AppState::new(tx, rx2, PathBuf::from("."));
        app.overlay = Overlay::None;
        (app, cmd_rx)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn q_quits() {
        let (mut app, _rx) = test_app();
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn number_keys_switch_panels() {
        let (mut app, _rx) = test_app();
        handle_key(&mut app, press(KeyCode::Char('3')));
        assert_eq!(app.active_panel, Panel::Distribution);
        handle_key(&mut app, press(KeyCode::Char('1')));
        assert_eq!(app.active_panel, Panel::History);
    }

    #[test]
    fn welcome_overlay_dismisses_on_any_key() {
        let (mut app, _rx) = test_app();
        app.overlay = Overlay::Welcome;
        handle_key(&mut app, press(KeyCode::Char('x')));
        assert_eq!(app.overlay, Overlay::None);
    }

    #[test]
    fn coin_input_sets_coin() {
        let (mut app, _rx) = test_app();
        app.overlay = Overlay::CoinInput;
        for c in "Solana".chars() {
            handle_key(&mut app, press(KeyCode::Char(c)));
        }
        handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(app.forecast.coin, "solana");
        assert_eq!(app.overlay, Overlay::None);
    }

    #[test]
    fn fetch_sends_worker_command() {
        let (mut app, rx) = test_app();
        handle_key(&mut app, press(KeyCode::Char('f')));
        assert!(app.history.fetch_in_progress);
        match rx.try_recv().unwrap() {
            WorkerCommand::FetchHistory { coin, force, .. } => {
                assert_eq!(coin, "bitcoin");
                assert!(!force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn forecast_requires_history() {
        let (mut app, rx) = test_app();
        app.active_panel = Panel::Forecast;
        handle_key(&mut app, press(KeyCode::Enter));
        assert!(!app.forecast.running);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn forecast_launches_with_sample_history() {
        let (mut app, rx) = test_app();
        app.load_sample();
        app.active_panel = Panel::Forecast;
        handle_key(&mut app, press(KeyCode::Enter));
        assert!(app.forecast.running);
        match rx.try_recv().unwrap() {
            WorkerCommand::RunForecast { config, .. } => {
                assert_eq!(config.forecast.coin, "sample-coin");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn settings_adjust_and_clamp() {
        let (mut app, _rx) = test_app();
        app.active_panel = Panel::Forecast;

        // paths row
        handle_key(&mut app, press(KeyCode::Char('l')));
        assert_eq!(app.forecast.paths, 1100);
        handle_key(&mut app, press(KeyCode::Char('h')));
        assert_eq!(app.forecast.paths, 1000);

        // horizon row
        handle_key(&mut app, press(KeyCode::Char('j')));
        handle_key(&mut app, press(KeyCode::Char('h')));
        assert_eq!(app.forecast.horizon_days, 25);

        // seed row: clear to entropy
        handle_key(&mut app, press(KeyCode::Char('j')));
        handle_key(&mut app, press(KeyCode::Backspace));
        assert_eq!(app.forecast.seed, None);
    }
}
