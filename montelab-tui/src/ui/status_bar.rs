//! Bottom status bar — last status message, panel hints.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{AppState, StatusLevel};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans: Vec<Span> = Vec::new();

    // Panel hints
    spans.push(Span::styled(
        " 1:History 2:Forecast 3:Distribution 4:Help q:Quit",
        theme::muted(),
    ));

    // Separator
    spans.push(Span::raw(" | "));

    // Busy indicator
    if app.history.fetch_in_progress {
        spans.push(Span::styled("fetching... ", theme::warning()));
    }
    if app.forecast.running {
        spans.push(Span::styled("simulating... ", theme::warning()));
    }

    // Status message
    if let Some((msg, level)) = &app.status_message {
        let style = match level {
            StatusLevel::Info => theme::accent(),
            StatusLevel::Warning => theme::warning(),
            StatusLevel::Error => theme::negative(),
        };
        spans.push(Span::styled(msg.as_str(), style));
    }

    let line = Line::from(spans);
    let para = Paragraph::new(line);
    f.render_widget(para, area);
}
