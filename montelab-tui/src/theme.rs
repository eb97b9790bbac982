//! Neon-on-dark theme tokens for the MonteLab TUI.
//!
//! Style helpers are free functions so panels can write
//! `theme::muted()` at call sites without threading a theme struct.

use ratatui::style::{Color, Modifier, Style};

/// Electric cyan — focus and highlights.
pub const ACCENT: Color = Color::Rgb(0, 255, 255);
/// Neon green — gains, success.
pub const POSITIVE: Color = Color::Rgb(0, 255, 128);
/// Hot pink — losses, failures.
pub const NEGATIVE: Color = Color::Rgb(255, 20, 147);
/// Neon orange — warnings.
pub const WARNING: Color = Color::Rgb(255, 140, 0);
/// Cool purple — secondary info.
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
/// Steel blue — muted text.
pub const MUTED: Color = Color::Rgb(100, 149, 237);
/// Light gray — secondary text.
pub const TEXT_SECONDARY: Color = Color::Rgb(170, 170, 170);

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn positive() -> Style {
    Style::default().fg(POSITIVE)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn neutral() -> Style {
    Style::default().fg(NEUTRAL)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn secondary() -> Style {
    Style::default().fg(TEXT_SECONDARY)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}

/// Color for a value relative to a reference (gain green, loss pink).
pub fn change_color(value: f64, reference: f64) -> Color {
    if value >= reference {
        POSITIVE
    } else {
        NEGATIVE
    }
}
