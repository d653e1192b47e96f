//! Console transcript and input line.

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use super::panel;
use crate::render::ConsoleView;
use crate::session::SessionState;

pub fn render_console(
    frame: &mut Frame,
    area: Rect,
    view: &ConsoleView,
    state: &SessionState,
    focused: bool,
) {
    let block = panel("Console", focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [transcript_area, input_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

    let lines: Vec<Line> = ConsoleView::tail(state, transcript_area.height as usize)
        .into_iter()
        .map(Line::from)
        .collect();
    frame.render_widget(Paragraph::new(lines), transcript_area);

    let input = if view.editing {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Cyan)),
            Span::raw(view.input.clone()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ])
    } else {
        Line::from(Span::styled(
            "press : to type",
            Style::default().fg(Color::DarkGray),
        ))
    };
    frame.render_widget(Paragraph::new(input), input_area);
}
