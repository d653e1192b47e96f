//! Callstack adapter.

use crate::protocol::CallstackPayload;

#[derive(Debug, Default)]
pub struct CallstackView {
    /// Frame names, top of stack first
    pub frames: Vec<String>,
}

impl CallstackView {
    pub fn update(&mut self, payload: &CallstackPayload) {
        self.frames = payload.frames.clone();
    }

    /// Display lines, innermost frame marked.
    pub fn lines(&self) -> Vec<String> {
        self.frames
            .iter()
            .enumerate()
            .map(|(depth, frame)| {
                let marker = if depth == 0 { ">" } else { " " };
                format!("{marker} {frame}")
            })
            .collect()
    }
}
