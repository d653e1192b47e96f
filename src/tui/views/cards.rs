//! Object card carousel and class diagram panels.
//!
//! A terminal cannot show the images themselves, so a card is drawn as its
//! metadata: PNG dimensions, or the text labels and links of an SVG.

use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};

use super::{panel, placeholder};
use crate::render::ObjectGraphView;
use crate::render::card::{CardBody, RenderedCard};
use crate::render::diagram::DiagramView;

fn body_lines(card: &RenderedCard, focused_link: Option<usize>) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    match &card.body {
        CardBody::Png { width, height } => {
            lines.push(Line::from(format!("PNG image, {}x{}", width, height)));
        }
        CardBody::Svg(doc) => {
            for text in &doc.text {
                lines.push(Line::from(text.clone()));
            }
            if !doc.links.is_empty() {
                lines.push(Line::default());
                let mut spans = vec![Span::styled(
                    "links: ",
                    Style::default().fg(Color::DarkGray),
                )];
                for (index, id) in doc.links.iter().enumerate() {
                    let mut style = Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED);
                    if focused_link == Some(index) {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    spans.push(Span::styled(format!("→{}", id), style));
                    spans.push(Span::raw(" "));
                }
                lines.push(Line::from(spans));
            }
        }
        CardBody::Unavailable(reason) => {
            lines.push(Line::from(Span::styled(
                format!("image unavailable: {}", reason),
                Style::default().fg(Color::Red),
            )));
        }
    }
    lines
}

pub fn render_card_panel(frame: &mut Frame, area: Rect, view: &ObjectGraphView, focused: bool) {
    let title = format!("Objects {}", view.position());
    let block = panel(&title, focused);

    let Some(card) = view.current() else {
        frame.render_widget(
            Paragraph::new(placeholder("No object cards")).block(block),
            area,
        );
        return;
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(
            card.id.clone(),
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  offset {}%", view.navigator.viewport_offset()),
            Style::default().fg(Color::DarkGray),
        ),
    ])];
    lines.extend(body_lines(card, view.link_focus));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

pub fn render_diagram(frame: &mut Frame, area: Rect, view: &DiagramView) {
    let block = panel("Class diagram", true);
    let lines = match &view.diagram {
        Some(card) => body_lines(card, None),
        None => vec![placeholder("No class diagram yet, press 2 to request it")],
    };
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}
