//! Diagram adapter: the class/object diagram, rendered like a single card.

use super::card::{self, RenderedCard};
use crate::protocol::DiagramPayload;

/// Id given to the diagram's rendered card.
pub const DIAGRAM_ID: &str = "class_diagram";

#[derive(Debug, Default)]
pub struct DiagramView {
    pub diagram: Option<RenderedCard>,
}

impl DiagramView {
    pub fn update(&mut self, payload: &DiagramPayload) {
        self.diagram = if payload.svg_base64.trim().is_empty() {
            None
        } else {
            Some(card::render_card(DIAGRAM_ID, &payload.svg_base64))
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::card::CardBody;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    #[test]
    fn test_diagram_renders_svg() {
        let mut view = DiagramView::default();
        view.update(&DiagramPayload {
            svg_base64: STANDARD.encode("<svg><text>Person</text></svg>"),
        });
        match view.diagram.map(|d| d.body) {
            Some(CardBody::Svg(doc)) => assert_eq!(doc.text, vec!["Person"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty_payload_clears_diagram() {
        let mut view = DiagramView::default();
        view.update(&DiagramPayload {
            svg_base64: STANDARD.encode("<svg/>"),
        });
        assert!(view.diagram.is_some());
        view.update(&DiagramPayload::default());
        assert!(view.diagram.is_none());
    }
}
