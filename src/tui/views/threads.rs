//! Threads panel.

use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, ListState, Paragraph};

use super::{panel, placeholder};
use crate::protocol::ThreadState;
use crate::render::ThreadsView;

fn state_color(state: ThreadState) -> Color {
    match state {
        ThreadState::Running => Color::Green,
        ThreadState::Suspended => Color::Yellow,
        ThreadState::Waiting => Color::Blue,
        ThreadState::Killed => Color::Red,
        ThreadState::Unknown => Color::DarkGray,
    }
}

pub fn render_threads(frame: &mut Frame, area: Rect, view: &ThreadsView, focused: bool) {
    let block = panel("Threads", focused);
    if view.rows.is_empty() {
        frame.render_widget(Paragraph::new(placeholder("No threads")).block(block), area);
        return;
    }

    let chosen = view.selected_name();
    let items: Vec<ListItem> = view
        .rows
        .iter()
        .map(|row| {
            let marker = if chosen == Some(row.name.as_str()) { "*" } else { " " };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{} {} ", marker, row.name)),
                Span::styled(
                    format!("({})", row.state.label()),
                    Style::default().fg(state_color(row.state)),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));
    let mut state = ListState::default().with_selected(Some(view.cursor));
    frame.render_stateful_widget(list, area, &mut state);
}
