//! Object graph adapter: rendered object cards as navigable slides.

use super::card::{self, RenderedCard};
use crate::navigator::{Direction, Navigator};
use crate::protocol::ObjectCardsPayload;

#[derive(Debug, Default)]
pub struct ObjectGraphView {
    pub cards: Vec<RenderedCard>,
    pub navigator: Navigator,
    /// Focused link on the current card
    pub link_focus: Option<usize>,
}

impl ObjectGraphView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render every card and rebuild the slide table in payload order.
    pub fn update(&mut self, payload: &ObjectCardsPayload) {
        self.cards = payload
            .cards
            .iter()
            .map(|entry| card::render_card(&entry.id, &entry.svg_base64))
            .collect();
        self.navigator
            .rebuild(self.cards.iter().map(|card| card.id.as_str()));
        self.link_focus = None;
    }

    pub fn current(&self) -> Option<&RenderedCard> {
        self.cards.get(self.navigator.current_index())
    }

    /// Jump to the card for `id`; a miss changes nothing.
    pub fn navigate_to(&mut self, id: &str) -> bool {
        let hit = self.navigator.navigate_to(id);
        if hit {
            self.link_focus = None;
        }
        hit
    }

    pub fn move_slide(&mut self, direction: Direction) {
        self.navigator.move_slide(direction);
        self.link_focus = None;
    }

    pub fn focus_next_link(&mut self) {
        let count = self.current().map_or(0, |card| card.links().len());
        self.link_focus = match self.link_focus {
            _ if count == 0 => None,
            None => Some(0),
            Some(i) => Some((i + 1) % count),
        };
    }

    /// Follow the focused link on the current card, as clicking it would.
    pub fn follow_link(&mut self) -> bool {
        let target = self
            .link_focus
            .and_then(|i| self.current()?.links().get(i).cloned());
        match target {
            Some(id) => self.navigate_to(&id),
            None => false,
        }
    }

    /// `i/N` position indicator.
    pub fn position(&self) -> String {
        if self.navigator.is_empty() {
            return "0/0".to_string();
        }
        format!(
            "{}/{}",
            self.navigator.current_index() + 1,
            self.navigator.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::CardEntry;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    fn svg_card(id: &str, links_to: &[&str]) -> CardEntry {
        let anchors: String = links_to
            .iter()
            .map(|target| format!(r#"<a href="/obj/{target}"><text>{target}</text></a>"#))
            .collect();
        CardEntry {
            id: id.to_string(),
            svg_base64: STANDARD.encode(format!("<svg>{anchors}</svg>")),
        }
    }

    fn view(cards: Vec<CardEntry>) -> ObjectGraphView {
        let mut view = ObjectGraphView::new();
        view.update(&ObjectCardsPayload { cards });
        view
    }

    #[test]
    fn test_slides_in_payload_order() {
        let mut view = view(vec![svg_card("7", &[]), svg_card("3", &[])]);
        assert!(view.navigate_to("3"));
        assert_eq!(view.navigator.viewport_offset(), 100);
        assert_eq!(view.position(), "2/2");
    }

    #[test]
    fn test_card_link_navigates() {
        let mut view = view(vec![svg_card("1", &["2"]), svg_card("2", &["1"])]);
        view.focus_next_link();
        assert!(view.follow_link());
        assert_eq!(view.current().map(|c| c.id.as_str()), Some("2"));
    }

    #[test]
    fn test_link_to_unrendered_card_is_noop() {
        let mut view = view(vec![svg_card("1", &["99"])]);
        view.focus_next_link();
        assert!(!view.follow_link());
        assert_eq!(view.navigator.current_index(), 0);
    }

    #[test]
    fn test_broken_card_does_not_hide_others() {
        let mut view = view(vec![
            CardEntry {
                id: "bad".to_string(),
                svg_base64: "%%%".to_string(),
            },
            svg_card("ok", &[]),
        ]);
        assert_eq!(view.cards.len(), 2);
        assert!(view.navigate_to("ok"));
        assert!(matches!(
            view.current().map(|c| &c.body),
            Some(card::CardBody::Svg(_))
        ));
    }

    #[test]
    fn test_empty_snapshot() {
        let mut view = view(Vec::new());
        view.move_slide(Direction::Forward);
        view.focus_next_link();
        assert!(!view.follow_link());
        assert!(view.current().is_none());
        assert_eq!(view.position(), "0/0");
    }
}
