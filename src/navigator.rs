//! Object-graph navigation over the rendered object cards.
//!
//! Cards are laid out as a horizontal strip of slides; the viewport shows one
//! slide at a time and is shifted by `index * 100%` of a slide's width.
//! Lookups go through an `id -> position` table that is rebuilt every time
//! the object cards snapshot is replaced.

use std::collections::HashMap;

/// Direction for [`Navigator::move_slide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn step(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

#[derive(Debug, Default)]
pub struct Navigator {
    /// Card ids in payload order
    slides: Vec<String>,
    positions: HashMap<String, usize>,
    current: usize,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the slide table from a fresh snapshot, in payload order.
    ///
    /// The current index survives the rebuild while it is still in range.
    /// A duplicated id resolves to its first slide.
    pub fn rebuild<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        self.slides = ids.into_iter().map(str::to_string).collect();
        self.positions.clear();
        for (index, id) in self.slides.iter().enumerate() {
            self.positions.entry(id.clone()).or_insert(index);
        }
        if self.current >= self.slides.len() {
            self.current = 0;
        }
    }

    /// Jump to the slide showing `id`. Returns `false`, changing nothing,
    /// when no such slide is rendered.
    pub fn navigate_to(&mut self, id: &str) -> bool {
        match self.positions.get(id) {
            Some(&index) => {
                self.current = index;
                tracing::debug!(%id, index, "navigated to object card");
                true
            }
            None => {
                tracing::debug!(%id, "no rendered card for reference");
                false
            }
        }
    }

    /// Step one slide, wrapping at both ends. No-op without slides.
    pub fn move_slide(&mut self, direction: Direction) {
        let len = self.slides.len();
        if len == 0 {
            return;
        }
        let next = (self.current as i64 + direction.step()).rem_euclid(len as i64);
        self.current = next as usize;
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_id(&self) -> Option<&str> {
        self.slides.get(self.current).map(String::as_str)
    }

    /// Horizontal viewport shift in percent of one slide's width.
    pub fn viewport_offset(&self) -> usize {
        self.current * 100
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}
