//! Threads adapter: thread list with a selection that survives refreshes.

use crate::protocol::{ThreadDescriptor, ThreadState, ThreadsPayload};

/// Row of the threads list. The key and the label are kept apart so the
/// selection never has to be parsed back out of display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRow {
    pub name: String,
    pub state: ThreadState,
}

impl ThreadRow {
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.state.label())
    }
}

impl From<&ThreadDescriptor> for ThreadRow {
    fn from(thread: &ThreadDescriptor) -> Self {
        Self {
            name: thread.name.clone(),
            state: thread.state,
        }
    }
}

#[derive(Debug, Default)]
pub struct ThreadsView {
    pub rows: Vec<ThreadRow>,
    /// Cursor position in `rows`
    pub cursor: usize,
    /// Name of the thread the user last chose
    selected_name: Option<String>,
}

impl ThreadsView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list. The cursor follows the chosen thread by name when
    /// it is still present.
    pub fn update(&mut self, payload: &ThreadsPayload) {
        self.rows = payload.threads.iter().map(ThreadRow::from).collect();
        let followed = self
            .selected_name
            .as_deref()
            .and_then(|name| self.rows.iter().position(|row| row.name == name));
        self.cursor = match followed {
            Some(index) => index,
            None => self.cursor.min(self.rows.len().saturating_sub(1)),
        };
    }

    pub fn select_next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.cursor = (self.cursor + 1).min(self.rows.len() - 1);
    }

    pub fn select_previous(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Choose the thread under the cursor. Returns its name for the
    /// `thread-selected` action.
    pub fn choose(&mut self) -> Option<String> {
        let name = self.rows.get(self.cursor)?.name.clone();
        self.selected_name = Some(name.clone());
        Some(name)
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected_name.as_deref()
    }
}
