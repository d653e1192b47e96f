//! TUI Views module
//!
//! One renderer per adapter. Views only read adapter state; key handling
//! lives in the app.

mod callstack;
mod cards;
mod console;
mod threads;
mod variables;

pub use callstack::render_callstack;
pub use cards::{render_card_panel, render_diagram};
pub use console::render_console;
pub use threads::render_threads;
pub use variables::render_variables;

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders};

/// Bordered panel, highlighted when it has keyboard focus.
pub(crate) fn panel(title: &str, focused: bool) -> Block<'static> {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(format!(" {} ", title))
}

/// Dimmed placeholder line for empty panels.
pub(crate) fn placeholder(text: &str) -> Line<'_> {
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}
