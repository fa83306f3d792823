// src/session/machine.rs

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::models::profile::CandidateProfile;

use super::{cursor::Cursor, ledger::AnswerLedger, paper::TestPaper, scorer, timer::SessionTimer};

/// Lifecycle phase of a test session.
///
/// `Gated → Active → Submitting → Submitted`, with a single backwards
/// edge: `Submitting → Active` when persisting the result fails. There
/// is no path back to `Gated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Gated,
    Active,
    Submitting,
    Submitted,
}

/// Direction of a navigation request.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Next,
    Previous,
}

/// A finished, scored attempt awaiting persistence.
///
/// Cached on the session when first computed so that a retry after a
/// failed submission re-submits the identical attempt; the score is
/// never recomputed.
#[derive(Debug, Clone)]
pub struct ScoredAttempt {
    pub profile: CandidateProfile,
    pub total_score: u32,
}

/// Outcome of recording an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The choice is in the ledger.
    Recorded,
    /// Position or option index falls outside the paper.
    OutOfRange,
    /// The session is not Active; nothing happened.
    Ignored,
}

/// Outcome of asking to end the test.
#[derive(Debug)]
pub enum EndOutcome {
    /// Transitioned to Submitting; persist this attempt.
    Submitting(ScoredAttempt),
    /// The session is not Active, or it is Active but the candidate is
    /// neither on the last question nor out of time; nothing happened.
    NotEligible,
}

/// One candidate's test session: paper, countdown, answers, cursor and
/// lifecycle phase, advanced only through the methods below.
///
/// Every operation is total over the current phase. A call that does
/// not apply in the current phase is a no-op, not an error; this is
/// what makes the ticker and the HTTP handlers safe to interleave.
#[derive(Debug)]
pub struct TestSession {
    profile: CandidateProfile,
    paper: TestPaper,
    timer: SessionTimer,
    cursor: Cursor,
    ledger: AnswerLedger,
    phase: Phase,
    phase_entered_at: Instant,
    pending: Option<ScoredAttempt>,
    serial_number: Option<i64>,
}

impl TestSession {
    pub fn new(profile: CandidateProfile, paper: TestPaper, duration_secs: u32) -> Self {
        let question_count = paper.len();
        Self {
            profile,
            paper,
            timer: SessionTimer::new(duration_secs),
            cursor: Cursor::new(question_count),
            ledger: AnswerLedger::new(),
            phase: Phase::Gated,
            phase_entered_at: Instant::now(),
            pending: None,
            serial_number: None,
        }
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.phase_entered_at = Instant::now();
    }

    /// Dismisses the instructions gate and lets the countdown run.
    pub fn start(&mut self) {
        if self.phase == Phase::Gated {
            self.enter(Phase::Active);
        }
    }

    /// Advances the countdown by one second.
    ///
    /// Only an Active session ticks: the instructions gate freezes the
    /// clock, and Submitting/Submitted sessions are inert (a tick that
    /// lands while a submission is in flight cannot trigger a second
    /// one). On the single expiry signal the session moves to
    /// Submitting and hands back the scored attempt for persistence.
    pub fn tick(&mut self) -> Option<ScoredAttempt> {
        if self.phase != Phase::Active {
            return None;
        }
        if self.timer.tick() {
            let attempt = self.scored_attempt();
            self.enter(Phase::Submitting);
            return Some(attempt);
        }
        None
    }

    /// Records the candidate's choice for the question at `position`.
    /// The chosen index must name one of that question's options.
    pub fn select_option(&mut self, position: usize, option_index: usize) -> SelectOutcome {
        if self.phase != Phase::Active {
            return SelectOutcome::Ignored;
        }
        match self.paper.question(position) {
            Some(question) if option_index < question.options.len() => {
                self.ledger.record(position, option_index);
                SelectOutcome::Recorded
            }
            _ => SelectOutcome::OutOfRange,
        }
    }

    /// Moves the cursor one question in `direction`, absorbed silently
    /// at the ends of the paper. Returns the resulting position.
    pub fn navigate(&mut self, direction: Direction) -> usize {
        if self.phase != Phase::Active {
            return self.cursor.position();
        }
        match direction {
            Direction::Next => self.cursor.next(),
            Direction::Previous => self.cursor.previous(),
        }
    }

    /// Asks to end the test. Accepted while Active from the last
    /// question, or from any position once the timer has expired; the
    /// latter is the manual retry path after a failed automatic
    /// submission.
    pub fn end_test(&mut self) -> EndOutcome {
        if self.phase != Phase::Active {
            return EndOutcome::NotEligible;
        }
        if !self.cursor.at_last() && !self.timer.is_expired() {
            return EndOutcome::NotEligible;
        }
        let attempt = self.scored_attempt();
        self.enter(Phase::Submitting);
        EndOutcome::Submitting(attempt)
    }

    /// Marks the in-flight submission as persisted under `serial_number`.
    /// Terminal.
    pub fn complete_submission(&mut self, serial_number: i64) {
        if self.phase == Phase::Submitting {
            self.serial_number = Some(serial_number);
            self.enter(Phase::Submitted);
        }
    }

    /// Rolls an in-flight submission back to Active after a sink
    /// failure. The cached attempt, answers, cursor and exhausted timer
    /// all survive, so a retry re-submits the identical attempt.
    pub fn fail_submission(&mut self) {
        if self.phase == Phase::Submitting {
            self.enter(Phase::Active);
        }
    }

    /// The attempt to persist. Computed and cached on first use, then
    /// returned verbatim on every retry.
    fn scored_attempt(&mut self) -> ScoredAttempt {
        if let Some(attempt) = &self.pending {
            return attempt.clone();
        }
        let attempt = ScoredAttempt {
            profile: self.profile.clone(),
            total_score: scorer::score(&self.paper, &self.ledger),
        };
        self.pending = Some(attempt.clone());
        attempt
    }

    /// Whether the session has sat still long enough to be reaped from
    /// the store: gated but never started, submitted and long since
    /// viewed, or dead-ended in Active with the clock already run out.
    /// A session with a submission in flight is never stale.
    pub fn is_stale(&self, timeout: Duration) -> bool {
        let idle = self.phase_entered_at.elapsed() >= timeout;
        match self.phase {
            Phase::Gated | Phase::Submitted => idle,
            Phase::Active => idle && self.timer.is_expired(),
            Phase::Submitting => false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.timer.remaining()
    }

    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn question_count(&self) -> usize {
        self.paper.len()
    }

    pub fn answered_count(&self) -> usize {
        self.ledger.answered_count()
    }

    pub fn serial_number(&self) -> Option<i64> {
        self.serial_number
    }

    pub fn paper(&self) -> &TestPaper {
        &self.paper
    }

    pub fn max_score(&self) -> u32 {
        self.paper.max_score()
    }
}
