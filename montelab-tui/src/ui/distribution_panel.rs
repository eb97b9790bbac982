//! Panel 3 — Distribution: final-price histogram and summary statistics.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use montelab_runner::ForecastResult;

use crate::app::AppState;
use crate::theme;

const BUCKETS: usize = 16;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(result) = app.forecast.result.as_deref() else {
        render_empty(f, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(38)])
        .split(area);

    render_histogram(f, chunks[0], result);
    render_stats(f, chunks[1], result);
}

fn render_empty(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "No simulation results yet.",
            theme::muted(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Run a forecast in panel 2 (Enter) to see the final-price distribution.",
            theme::muted(),
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

/// Bucket final prices into a fixed number of bins and draw horizontal bars.
fn render_histogram(f: &mut Frame, area: Rect, result: &ForecastResult) {
    let prices = &result.simulation.final_prices;
    if prices.is_empty() {
        return;
    }

    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = ((max - min) / BUCKETS as f64).max(1e-12);

    let mut counts = [0usize; BUCKETS];
    for &p in prices {
        let idx = (((p - min) / width) as usize).min(BUCKETS - 1);
        counts[idx] += 1;
    }
    let peak = counts.iter().copied().max().unwrap_or(1).max(1);

    // Leave room for the "lo..hi count" prefix on each row.
    let bar_width = area.width.saturating_sub(26).max(10) as usize;
    let starting = result.simulation.starting_price;

    let mut lines: Vec<Line> = Vec::with_capacity(BUCKETS + 1);
    lines.push(Line::from(Span::styled(
        format!("Final price across {} paths", prices.len()),
        theme::accent_bold(),
    )));

    for (i, &count) in counts.iter().enumerate() {
        let lo = min + i as f64 * width;
        let hi = lo + width;
        let filled = (count * bar_width).div_ceil(peak).min(bar_width);
        let bar: String = "█".repeat(filled);
        let mid = (lo + hi) / 2.0;
        let bar_style = Style::default().fg(theme::change_color(mid, starting));

        lines.push(Line::from(vec![
            Span::styled(format!("{lo:>9.2} "), theme::muted()),
            Span::styled(bar, bar_style),
            Span::styled(format!(" {count}"), theme::secondary()),
        ]));
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn render_stats(f: &mut Frame, area: Rect, result: &ForecastResult) {
    let dist = &result.simulation.final_distribution;
    let starting = result.simulation.starting_price;

    let stat = |label: &str, value: f64| -> Line {
        let pct = (value / starting - 1.0) * 100.0;
        Line::from(vec![
            Span::styled(format!("{label:<8}"), theme::muted()),
            Span::styled(
                format!("{value:>12.2} "),
                Style::default().fg(theme::change_color(value, starting)),
            ),
            Span::styled(format!("({pct:+.1}%)"), theme::muted()),
        ])
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!(
                "Horizon {} days, start {starting:.2}",
                result.simulation.horizon_days
            ),
            theme::accent_bold(),
        )),
        Line::from(""),
        stat("Min", dist.min),
        stat("P05", dist.p05),
        stat("Median", dist.median),
        stat("P95", dist.p95),
        stat("Max", dist.max),
        stat("Mean", dist.mean),
    ];

    if let Some(inv) = &result.investment {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Investment of {:.2}", inv.principal),
            theme::accent_bold(),
        )));
        let value = |label: &str, v: f64| -> Line {
            Line::from(vec![
                Span::styled(format!("{label:<8}"), theme::muted()),
                Span::styled(
                    format!("{v:>12.2}"),
                    Style::default().fg(theme::change_color(v, inv.principal)),
                ),
            ])
        };
        lines.push(value("Median", inv.median_value));
        lines.push(value("Worst", inv.min_value));
        lines.push(value("Best", inv.max_value));
        lines.push(Line::from(vec![
            Span::styled("Break-even ", theme::muted()),
            Span::styled(
                format!(
                    "{}/{} paths ({:.1}%)",
                    inv.paths_at_or_above_principal,
                    result.simulation.num_paths,
                    inv.share_at_or_above_principal * 100.0
                ),
                theme::secondary(),
            ),
        ]));
    }

    f.render_widget(Paragraph::new(lines), area);
}
