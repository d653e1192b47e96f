//! Variables adapter: the variables table with embedded object links.
//!
//! Every push rebuilds the table and resets the highlighted row. Activating
//! a row navigates to the row's own card unless one of the row's embedded
//! links has focus, in which case that link's target wins.

use super::value::{self, ValueSegment};
use crate::protocol::{VariableEntry, VariablesPayload};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRow {
    pub id: String,
    /// Aliases joined for display
    pub names: String,
    pub py_type: String,
    pub scope: String,
    pub segments: Vec<ValueSegment>,
}

impl From<&VariableEntry> for VariableRow {
    fn from(entry: &VariableEntry) -> Self {
        Self {
            id: entry.id.clone(),
            names: entry.names.join(", "),
            py_type: entry.py_type.clone(),
            scope: entry.scope.clone(),
            segments: value::segments(&entry.value),
        }
    }
}

impl VariableRow {
    pub fn link_ids(&self) -> Vec<&str> {
        value::link_ids(&self.segments)
    }
}

#[derive(Debug, Default)]
pub struct VariablesView {
    pub rows: Vec<VariableRow>,
    /// Highlighted row
    pub selected: usize,
    /// Focused embedded link within the highlighted row
    pub link_focus: Option<usize>,
}

impl VariablesView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, payload: &VariablesPayload) {
        self.rows = payload.variables.iter().map(VariableRow::from).collect();
        self.selected = 0;
        self.link_focus = None;
    }

    pub fn select_next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.rows.len() - 1);
        self.link_focus = None;
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.link_focus = None;
    }

    /// Cycle focus through the highlighted row's links, then back to the row.
    pub fn focus_next_link(&mut self) {
        let count = self.current_link_count();
        self.link_focus = match self.link_focus {
            _ if count == 0 => None,
            None => Some(0),
            Some(i) if i + 1 < count => Some(i + 1),
            Some(_) => None,
        };
    }

    pub fn focus_previous_link(&mut self) {
        let count = self.current_link_count();
        self.link_focus = match self.link_focus {
            _ if count == 0 => None,
            None => Some(count - 1),
            Some(0) => None,
            Some(i) => Some(i - 1),
        };
    }

    /// Card id to navigate to for the highlighted row.
    pub fn activate(&self) -> Option<String> {
        let row = self.rows.get(self.selected)?;
        let target = match self.link_focus {
            Some(i) => row.link_ids().get(i).copied().unwrap_or(&row.id),
            None => &row.id,
        };
        Some(target.to_string())
    }

    /// Card id behind link `link` of row `row`, as a click on that link would.
    pub fn link_target(&self, row: usize, link: usize) -> Option<String> {
        self.rows
            .get(row)?
            .link_ids()
            .get(link)
            .map(|id| id.to_string())
    }

    fn current_link_count(&self) -> usize {
        self.rows
            .get(self.selected)
            .map_or(0, |row| row.link_ids().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ValueView;

    fn entry(id: &str, name: &str, value: ValueView) -> VariableEntry {
        VariableEntry {
            names: vec![name.to_string()],
            py_type: "Node".to_string(),
            value,
            scope: "local".to_string(),
            id: id.to_string(),
        }
    }

    fn view() -> VariablesView {
        let mut view = VariablesView::new();
        view.update(&VariablesPayload {
            variables: vec![
                entry("42", "head", ValueView::composite("refid:7")),
                entry("43", "pair", ValueView::composite("(refid:8, refid:9)")),
                entry("44", "n", ValueView::primitive("3")),
            ],
        });
        view
    }

    #[test]
    fn test_refid_rendered_as_link() {
        let view = view();
        assert_eq!(
            view.rows[0].segments,
            vec![ValueSegment::Link {
                id: "7".to_string()
            }]
        );
        assert_eq!(view.link_target(0, 0).as_deref(), Some("7"));
    }

    #[test]
    fn test_row_activation_targets_row_id() {
        let mut view = view();
        view.select_next();
        assert_eq!(view.activate().as_deref(), Some("43"));
    }

    #[test]
    fn test_focused_link_wins_over_row() {
        let mut view = view();
        view.select_next();
        view.focus_next_link();
        view.focus_next_link();
        assert_eq!(view.activate().as_deref(), Some("9"));
        view.focus_next_link();
        assert_eq!(view.link_focus, None);
        view.focus_previous_link();
        assert_eq!(view.activate().as_deref(), Some("9"));
    }

    #[test]
    fn test_primitive_rows_have_no_links() {
        let mut view = view();
        view.select_next();
        view.select_next();
        view.focus_next_link();
        assert_eq!(view.link_focus, None);
        assert_eq!(view.activate().as_deref(), Some("44"));
    }

    #[test]
    fn test_push_resets_highlight() {
        let mut view = view();
        view.select_next();
        view.focus_next_link();
        view.update(&VariablesPayload {
            variables: vec![entry("1", "x", ValueView::primitive("1"))],
        });
        assert_eq!(view.selected, 0);
        assert_eq!(view.link_focus, None);
    }

    #[test]
    fn test_empty_table() {
        let mut view = VariablesView::new();
        view.select_next();
        view.focus_next_link();
        assert_eq!(view.activate(), None);
    }
}
