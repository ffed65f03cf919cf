//! Terminal capability detection and utilities

use owo_colors::{OwoColorize, colors::css};

/// Below this width, conflicts are listed without their occurrences.
const DETAIL_WIDTH: u16 = 100;

fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

fn terminal_width() -> Option<u16> {
    terminal_size::terminal_size().map(|(w, _)| w.0)
}

/// Check if the terminal is too narrow for per-occurrence conflict details
///
/// Each occurrence line holds the file, variant, version and comment.
pub fn is_narrow() -> bool {
    terminal_width().is_some_and(too_narrow)
}

const fn too_narrow(width: u16) -> bool {
    width < DETAIL_WIDTH
}

fn paint(text: &str, style: impl FnOnce(&str) -> String) -> String {
    if supports_color() {
        style(text)
    } else {
        text.to_string()
    }
}

/// Extension trait for colorizing output
pub trait Colorize: AsRef<str> {
    /// Color as success (green)
    fn success(&self) -> String {
        paint(self.as_ref(), |t| t.fg::<css::Green>().to_string())
    }

    /// Color as warning (amber)
    fn warning(&self) -> String {
        paint(self.as_ref(), |t| t.fg::<css::Orange>().to_string())
    }

    /// Color as error (red)
    fn error(&self) -> String {
        paint(self.as_ref(), |t| t.fg::<css::Red>().to_string())
    }

    /// Dim the text
    fn dim(&self) -> String {
        paint(self.as_ref(), |t| t.dimmed().to_string())
    }
}

impl Colorize for str {}

impl Colorize for String {}
