// src/session/cursor.rs

/// Tracks which question the candidate is currently viewing.
///
/// The position always stays inside `[0, count)`. Moves past either end
/// are absorbed silently rather than rejected; moving never touches the
/// answers.
#[derive(Debug, Clone)]
pub struct Cursor {
    position: usize,
    count: usize,
}

impl Cursor {
    /// `count` is the number of questions on the paper and must be
    /// non-zero (guaranteed by the paper's non-empty invariant).
    pub fn new(count: usize) -> Self {
        Self { position: 0, count }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Jumps to `index`, clamped into range.
    pub fn move_to(&mut self, index: usize) -> usize {
        self.position = index.min(self.count - 1);
        self.position
    }

    /// Advances by one question; stays put on the last one.
    pub fn next(&mut self) -> usize {
        self.move_to(self.position + 1)
    }

    /// Steps back one question; stays put on the first one.
    pub fn previous(&mut self) -> usize {
        self.move_to(self.position.saturating_sub(1))
    }

    pub fn at_last(&self) -> bool {
        self.position + 1 == self.count
    }
}
