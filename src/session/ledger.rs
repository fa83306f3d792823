// src/session/ledger.rs

use std::collections::BTreeMap;

/// The candidate's answers, keyed by question position.
///
/// A position is "answered" exactly when it has an entry; an unanswered
/// question is absent, never stored as option zero. Re-answering
/// overwrites with no history kept.
#[derive(Debug, Clone, Default)]
pub struct AnswerLedger {
    entries: BTreeMap<usize, usize>,
}

impl AnswerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the chosen option for a question, replacing any earlier
    /// choice. Bounds are the caller's responsibility; the ledger only
    /// stores what the state machine has already checked.
    pub fn record(&mut self, position: usize, option_index: usize) {
        self.entries.insert(position, option_index);
    }

    pub fn get(&self, position: usize) -> Option<usize> {
        self.entries.get(&position).copied()
    }

    pub fn answered_count(&self) -> usize {
        self.entries.len()
    }
}
