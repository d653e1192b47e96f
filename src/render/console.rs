//! Console adapter: transcript display plus the input line.

use crate::session::{ConsoleLine, SessionState};

#[derive(Debug, Default)]
pub struct ConsoleView {
    /// Text being typed
    pub input: String,
    /// Whether keystrokes go to the input line
    pub editing: bool,
    /// Number of console snapshots received
    pub received: u64,
}

impl ConsoleView {
    pub fn on_output(&mut self) {
        self.received += 1;
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// Take the typed line for submission. Blank input is discarded.
    pub fn submit(&mut self) -> Option<String> {
        let text = std::mem::take(&mut self.input);
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// The newest `height` transcript lines, oldest first.
    pub fn tail(state: &SessionState, height: usize) -> Vec<String> {
        let skip = state.console_log().len().saturating_sub(height);
        state
            .console_log()
            .skip(skip)
            .map(ConsoleLine::display)
            .collect()
    }
}
