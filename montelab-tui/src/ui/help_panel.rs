//! Panel 4 — Help: keyboard shortcuts and documentation.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, _app: &AppState) {
    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, "Global Navigation");
    key(&mut lines, "1-4", "Switch to panel by number");
    key(&mut lines, "Tab / Shift+Tab", "Cycle panels forward / back");
    key(&mut lines, "q", "Quit");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 1 — History");
    key(&mut lines, "f", "Fetch price history (cache-first)");
    key(&mut lines, "r", "Force refresh from CoinGecko");
    key(&mut lines, "c", "Change coin id");
    key(&mut lines, "s", "Load built-in sample data");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 2 — Forecast");
    key(&mut lines, "j / k", "Move between settings");
    key(&mut lines, "h / l", "Adjust setting value");
    key(&mut lines, "Backspace", "Clear seed or principal");
    key(&mut lines, "Enter", "Run Monte Carlo forecast");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 3 — Distribution");
    key(&mut lines, "", "Displays final-price histogram from last run");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 4 — Help (this panel)");
    key(&mut lines, "e", "Open error history overlay");
    lines.push(Line::from(""));

    section(&mut lines, "Settings");
    key(&mut lines, "Paths", "Number of simulated price paths");
    key(&mut lines, "Horizon", "Forecast length in days");
    key(&mut lines, "Seed", "Fixed seed for reproducible runs (clear for entropy)");
    key(&mut lines, "Principal", "Optional investment to project (clear to disable)");
    key(&mut lines, "History", "Days of history used to estimate drift/volatility");

    let para = Paragraph::new(lines);
    f.render_widget(para, area);
}

fn section<'a>(lines: &mut Vec<Line<'a>>, title: &str) {
    lines.push(Line::from(Span::styled(title.to_string(), theme::accent_bold())));
}

fn key<'a>(lines: &mut Vec<Line<'a>>, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {:>20}  ", keys), theme::accent()),
        Span::styled(desc.to_string(), theme::muted()),
    ]));
}
