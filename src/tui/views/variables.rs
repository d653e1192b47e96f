//! Variables table.
//!
//! Embedded object references are drawn as links; the focused link of the
//! highlighted row is shown reversed.

use ratatui::prelude::*;
use ratatui::widgets::{Cell, Paragraph, Row, Table, TableState};

use super::{panel, placeholder};
use crate::render::VariablesView;
use crate::render::value::{self, ValueSegment};

const LINK_STYLE: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED);

/// One `Line` per attribute. Link numbering runs across lines so it matches
/// the row's link focus.
fn value_lines(segments: &[ValueSegment], focused_link: Option<usize>) -> Vec<Line<'static>> {
    let mut link_index = 0;
    value::lines(segments)
        .into_iter()
        .map(|line| {
            let spans: Vec<Span> = line
                .into_iter()
                .map(|segment| match segment {
                    ValueSegment::Text(text) => Span::raw(text),
                    ValueSegment::Link { id } => {
                        let style = if focused_link == Some(link_index) {
                            LINK_STYLE.add_modifier(Modifier::REVERSED)
                        } else {
                            LINK_STYLE
                        };
                        link_index += 1;
                        Span::styled(format!("→{}", id), style)
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

pub fn render_variables(frame: &mut Frame, area: Rect, view: &VariablesView, focused: bool) {
    let block = panel("Variables", focused);
    if view.rows.is_empty() {
        frame.render_widget(Paragraph::new(placeholder("No variables")).block(block), area);
        return;
    }

    let rows: Vec<Row> = view
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let focus = if index == view.selected {
                view.link_focus
            } else {
                None
            };
            let lines = value_lines(&row.segments, focus);
            let height = lines.len().max(1) as u16;
            Row::new(vec![
                Cell::from(row.names.clone()),
                Cell::from(row.py_type.clone()).style(Style::default().fg(Color::Magenta)),
                Cell::from(Text::from(lines)),
                Cell::from(row.scope.clone()).style(Style::default().fg(Color::DarkGray)),
                Cell::from(row.id.clone()).style(Style::default().fg(Color::Blue)),
            ])
            .height(height)
        })
        .collect();

    let widths = [
        Constraint::Percentage(20),
        Constraint::Percentage(15),
        Constraint::Percentage(45),
        Constraint::Percentage(10),
        Constraint::Percentage(10),
    ];
    let header = Row::new(vec!["Name", "Type", "Value", "Scope", "Id"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = TableState::default().with_selected(Some(view.selected));
    frame.render_stateful_widget(table, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{VariableEntry, VariablesPayload, ValueView};
    use ratatui::backend::TestBackend;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_value_lines_marks_focused_link() {
        let segments = vec![
            ValueSegment::Text("[".to_string()),
            ValueSegment::Link { id: "1".to_string() },
            ValueSegment::Link { id: "2".to_string() },
        ];
        let lines = value_lines(&segments, Some(1));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].spans[2].content, "→2");
        assert!(lines[0].spans[2].style.add_modifier.contains(Modifier::REVERSED));
        assert!(!lines[0].spans[1].style.add_modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn test_value_lines_one_per_attribute() {
        let segments = value::segments(&ValueView::composite("next: refid:7\nval: 3"));
        let lines = value_lines(&segments, Some(0));
        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&lines[0]), "next: →7");
        assert_eq!(line_text(&lines[1]), "val: 3");
        assert!(lines[0].spans[1].style.add_modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn test_multiline_value_renders_on_separate_rows() {
        let mut view = VariablesView::new();
        view.update(&VariablesPayload {
            variables: vec![VariableEntry {
                names: vec!["head".to_string()],
                py_type: "Node".to_string(),
                value: ValueView::composite("next: refid:7\nval: 3"),
                scope: "local".to_string(),
                id: "42".to_string(),
            }],
        });

        let mut terminal = Terminal::new(TestBackend::new(100, 8)).unwrap();
        terminal
            .draw(|frame| render_variables(frame, frame.area(), &view, true))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let rows: Vec<String> = (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect()
            })
            .collect();
        let first = rows.iter().position(|r| r.contains("next: →7")).unwrap();
        assert!(rows[first + 1].contains("val: 3"));
        assert!(!rows[first].contains("val: 3"));
    }
}
