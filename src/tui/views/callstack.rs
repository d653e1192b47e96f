//! Call stack panel.

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use super::{panel, placeholder};
use crate::render::CallstackView;

pub fn render_callstack(frame: &mut Frame, area: Rect, view: &CallstackView, focused: bool) {
    let lines: Vec<Line> = if view.frames.is_empty() {
        vec![placeholder("No frames")]
    } else {
        view.lines().into_iter().map(Line::from).collect()
    };
    frame.render_widget(
        Paragraph::new(lines).block(panel("Call stack", focused)),
        area,
    );
}
