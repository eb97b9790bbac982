//! Panel 1 — History: price history chart with min/max/avg annotations.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Chart, Dataset, GraphType, Paragraph};
use ratatui::Frame;

use montelab_core::data::DataSource;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(series) = &app.history.series else {
        render_empty(f, area, app);
        return;
    };

    // Stats header on top, chart below.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(5)])
        .split(area);

    render_stats(f, chunks[0], app);
    render_chart(f, chunks[1], series.prices().collect(), series.coin_id());
}

fn render_empty(f: &mut Frame, area: Rect, app: &AppState) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("No history loaded for {}.", app.forecast.coin),
            theme::muted(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  f ", theme::accent()),
            Span::styled("fetch from CoinGecko", theme::muted()),
        ]),
        Line::from(vec![
            Span::styled("  r ", theme::accent()),
            Span::styled("force refresh (skip cache)", theme::muted()),
        ]),
        Line::from(vec![
            Span::styled("  c ", theme::accent()),
            Span::styled("change coin", theme::muted()),
        ]),
        Line::from(vec![
            Span::styled("  s ", theme::accent()),
            Span::styled("load built-in sample data", theme::muted()),
        ]),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn render_stats(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(stats) = &app.history.stats else {
        return;
    };

    let source_label = match app.history.source {
        Some(DataSource::CoinGecko) => "coingecko",
        Some(DataSource::Cache) => "cache",
        Some(DataSource::Sample) => "sample",
        None => "?",
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{}/{} ", stats.coin_id, stats.vs_currency),
                theme::accent_bold(),
            ),
            Span::styled(
                format!(
                    "{} to {} ({} days, {source_label})",
                    stats.start_date, stats.end_date, stats.point_count
                ),
                theme::secondary(),
            ),
        ]),
        Line::from(vec![
            Span::styled("Low ", theme::muted()),
            Span::styled(format!("{:.2}", stats.min_price), theme::negative()),
            Span::styled(format!(" on {}   ", stats.min_date), theme::muted()),
            Span::styled("High ", theme::muted()),
            Span::styled(format!("{:.2}", stats.max_price), theme::positive()),
            Span::styled(format!(" on {}", stats.max_date), theme::muted()),
        ]),
        Line::from(vec![
            Span::styled("Avg ", theme::muted()),
            Span::styled(format!("{:.2}   ", stats.mean_price), theme::neutral()),
            Span::styled("Last ", theme::muted()),
            Span::styled(
                format!("{:.2}", stats.last_price),
                Style::default().fg(theme::change_color(stats.last_price, stats.mean_price)),
            ),
        ]),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn render_chart(f: &mut Frame, area: Rect, prices: Vec<f64>, label: &str) {
    if prices.is_empty() {
        return;
    }

    let min_y = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max_y = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let padding = (max_y - min_y).abs().max(1e-9) * 0.05;
    let y_min = min_y - padding;
    let y_max = max_y + padding;
    let x_max = prices.len().saturating_sub(1) as f64;

    let data: Vec<(f64, f64)> = prices
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64, v))
        .collect();

    let dataset = Dataset::default()
        .name(label)
        .marker(symbols::Marker::Braille)
        .style(Style::default().fg(theme::ACCENT))
        .graph_type(GraphType::Line)
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .x_axis(
            Axis::default()
                .title(Span::styled("Days", theme::muted()))
                .style(theme::muted())
                .bounds([0.0, x_max.max(1.0)])
                .labels(vec![
                    Span::styled("0", theme::muted()),
                    Span::styled(format!("{}", prices.len()), theme::muted()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled("Price", theme::muted()))
                .style(theme::muted())
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::styled(format!("{y_min:.2}"), theme::muted()),
                    Span::styled(format!("{y_max:.2}"), theme::muted()),
                ]),
        );

    f.render_widget(chart, area);
}
