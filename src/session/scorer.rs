// src/session/scorer.rs

use crate::config::MARKS_PER_QUESTION;

use super::{ledger::AnswerLedger, paper::TestPaper};

/// Computes the total score for an attempt.
///
/// Each position where the recorded option index equals the question's
/// correct index earns [`MARKS_PER_QUESTION`]; unanswered and wrong
/// answers earn nothing. Pure over its inputs, so scoring the same
/// paper and ledger twice always yields the same total.
pub fn score(paper: &TestPaper, ledger: &AnswerLedger) -> u32 {
    paper
        .questions()
        .iter()
        .enumerate()
        .map(|(position, question)| match ledger.get(position) {
            Some(choice) if choice == question.correct_option_index => MARKS_PER_QUESTION,
            _ => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::paper::PaperQuestion;

    fn three_question_paper() -> TestPaper {
        // Correct indices 0, 1, 2.
        let questions = (0..3)
            .map(|n| PaperQuestion {
                id: format!("q{}", n + 1),
                prompt: format!("Question {}", n + 1),
                options: vec![
                    "first".to_string(),
                    "second".to_string(),
                    "third".to_string(),
                ],
                correct_option_index: n,
            })
            .collect();
        TestPaper::from_bank(questions)
    }

    #[test]
    fn test_two_of_three_correct_scores_four() {
        let paper = three_question_paper();
        let mut ledger = AnswerLedger::new();
        ledger.record(0, 0);
        ledger.record(1, 1);
        ledger.record(2, 1); // Wrong
        assert_eq!(score(&paper, &ledger), 4);
    }

    #[test]
    fn test_empty_ledger_scores_zero() {
        let paper = three_question_paper();
        let ledger = AnswerLedger::new();
        assert_eq!(score(&paper, &ledger), 0);
    }

    #[test]
    fn test_full_marks_and_idempotence() {
        let paper = three_question_paper();
        let mut ledger = AnswerLedger::new();
        ledger.record(0, 0);
        ledger.record(1, 1);
        ledger.record(2, 2);
        assert_eq!(score(&paper, &ledger), paper.max_score());
        assert_eq!(score(&paper, &ledger), paper.max_score());
    }

    #[test]
    fn test_score_never_exceeds_maximum() {
        let paper = three_question_paper();
        let mut ledger = AnswerLedger::new();
        // Extra entries beyond the paper are ignored entirely.
        for position in 0..10 {
            ledger.record(position, 0);
        }
        assert!(score(&paper, &ledger) <= paper.max_score());
    }
}
