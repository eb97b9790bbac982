//! Panel 2 — Forecast: settings column plus the percentile fan chart.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Chart, Dataset, GraphType, Paragraph};
use ratatui::Frame;

use montelab_runner::ForecastResult;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(20)])
        .split(area);

    render_settings(f, chunks[0], app);

    match app.forecast.result.as_deref() {
        Some(result) => render_fan(f, chunks[1], result),
        None => render_fan_empty(f, chunks[1]),
    }
}

fn render_settings(f: &mut Frame, area: Rect, app: &AppState) {
    let fc = &app.forecast;

    let seed_display = match fc.seed {
        Some(seed) => seed.to_string(),
        None => "(entropy)".to_string(),
    };
    let principal_display = match fc.principal {
        Some(p) => format!("{p:.2}"),
        None => "(off)".to_string(),
    };

    let rows: [(&str, String); 5] = [
        ("Paths", fc.paths.to_string()),
        ("Horizon (days)", fc.horizon_days.to_string()),
        ("Seed", seed_display),
        ("Principal", principal_display),
        ("History (days)", fc.history_days.to_string()),
    ];

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(
        format!("{}/{}", fc.coin, fc.vs_currency),
        theme::accent_bold(),
    )));
    lines.push(Line::from(""));

    for (i, (label, value)) in rows.iter().enumerate() {
        let selected = i == fc.cursor;
        let marker = if selected { "> " } else { "  " };
        let label_style = if selected {
            theme::accent().add_modifier(Modifier::BOLD)
        } else {
            theme::muted()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker}{label:<16}"), label_style),
            Span::styled(value.clone(), theme::secondary()),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "j/k select  h/l adjust",
        theme::muted(),
    )));
    lines.push(Line::from(Span::styled(
        "Bksp clear  Enter run",
        theme::muted(),
    )));

    if let Some(result) = app.forecast.result.as_deref() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Last run", theme::accent_bold())));
        lines.push(Line::from(Span::styled(
            format!("seed {}", result.simulation.master_seed),
            theme::secondary(),
        )));
        lines.push(Line::from(Span::styled(
            format!(
                "mu {:+.5} sigma {:.5}",
                result.simulation.drift, result.simulation.volatility
            ),
            theme::secondary(),
        )));
        lines.push(Line::from(Span::styled(
            format!("run {}", &result.run_id[..12.min(result.run_id.len())]),
            theme::muted(),
        )));
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn render_fan_empty(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            "No forecast yet — press Enter to simulate.",
            theme::muted(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Load history in panel 1 first (f to fetch, s for sample).",
            theme::muted(),
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

/// Percentile fan: p05/p95 outer band, p25/p75 inner band, median line.
fn render_fan(f: &mut Frame, area: Rect, result: &ForecastResult) {
    let days = &result.simulation.days;
    if days.is_empty() {
        return;
    }

    let p05: Vec<(f64, f64)> = days.iter().map(|d| (d.day as f64, d.p05)).collect();
    let p25: Vec<(f64, f64)> = days.iter().map(|d| (d.day as f64, d.p25)).collect();
    let median: Vec<(f64, f64)> = days.iter().map(|d| (d.day as f64, d.median)).collect();
    let p75: Vec<(f64, f64)> = days.iter().map(|d| (d.day as f64, d.p75)).collect();
    let p95: Vec<(f64, f64)> = days.iter().map(|d| (d.day as f64, d.p95)).collect();

    let y_min = days.iter().map(|d| d.p05).fold(f64::INFINITY, f64::min);
    let y_max = days.iter().map(|d| d.p95).fold(f64::NEG_INFINITY, f64::max);
    let padding = (y_max - y_min).abs().max(1e-9) * 0.05;
    let y_lo = y_min - padding;
    let y_hi = y_max + padding;
    let x_max = (days.len() - 1) as f64;

    fn band<'a>(name: &str, data: &'a [(f64, f64)], style: Style) -> Dataset<'a> {
        Dataset::default()
            .name(name.to_string())
            .marker(symbols::Marker::Braille)
            .style(style)
            .graph_type(GraphType::Line)
            .data(data)
    }

    // Median drawn last so it sits on top of the bands.
    let datasets = vec![
        band("p05", &p05, theme::muted()),
        band("p95", &p95, theme::muted()),
        band("p25", &p25, theme::neutral()),
        band("p75", &p75, theme::neutral()),
        band("median", &median, Style::default().fg(theme::ACCENT)),
    ];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title(Span::styled("Days ahead", theme::muted()))
                .style(theme::muted())
                .bounds([0.0, x_max.max(1.0)])
                .labels(vec![
                    Span::styled("0", theme::muted()),
                    Span::styled(format!("{}", days.len() - 1), theme::muted()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled("Price", theme::muted()))
                .style(theme::muted())
                .bounds([y_lo, y_hi])
                .labels(vec![
                    Span::styled(format!("{y_lo:.2}"), theme::muted()),
                    Span::styled(format!("{y_hi:.2}"), theme::muted()),
                ]),
        );

    f.render_widget(chart, area);
}
