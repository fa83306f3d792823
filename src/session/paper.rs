// src/session/paper.rs

use sqlx::SqlitePool;

use crate::{
    config::{MARKS_PER_QUESTION, TEST_QUESTION_COUNT},
    error::AppError,
    models::question::Question,
};

/// One question as it appears on a candidate's paper.
///
/// Loaded once when the session is created and immutable afterwards.
/// Bank edits made mid-test never reach a running session.
#[derive(Debug, Clone)]
pub struct PaperQuestion {
    /// Opaque identifier, unique within the paper.
    pub id: String,
    /// Rich markup; rendered by the client, never parsed here.
    pub prompt: String,
    /// Ordered option texts (2 to 5). Display order is answer order.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_option_index: usize,
}

/// The fixed list of questions a session is examined on. Never empty.
#[derive(Debug, Clone)]
pub struct TestPaper {
    questions: Vec<PaperQuestion>,
}

impl TestPaper {
    /// Builds a paper from the selected bank questions; an empty
    /// selection falls back to the built-in placeholder paper so a
    /// session can always be created.
    pub fn from_bank(questions: Vec<PaperQuestion>) -> Self {
        if questions.is_empty() {
            Self::placeholder()
        } else {
            Self { questions }
        }
    }

    /// The default paper served while the question bank has nothing
    /// selected: 25 sample questions with four options each, the first
    /// option always correct.
    pub fn placeholder() -> Self {
        let questions = (1..=TEST_QUESTION_COUNT)
            .map(|n| PaperQuestion {
                id: format!("q{}", n),
                prompt: format!(
                    "Sample Question {}: This is a placeholder question for testing purposes.",
                    n
                ),
                options: vec![
                    "Option A - First choice".to_string(),
                    "Option B - Second choice".to_string(),
                    "Option C - Third choice".to_string(),
                    "Option D - Fourth choice".to_string(),
                ],
                correct_option_index: 0,
            })
            .collect();
        Self { questions }
    }

    pub fn questions(&self) -> &[PaperQuestion] {
        &self.questions
    }

    pub fn question(&self, position: usize) -> Option<&PaperQuestion> {
        self.questions.get(position)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn max_score(&self) -> u32 {
        self.questions.len() as u32 * MARKS_PER_QUESTION
    }
}

/// Loads the live paper from the question bank: the selected questions
/// in creation order, capped at the paper size.
///
/// A storage failure propagates as an error (the session must not be
/// created against a paper we could not read); only a genuinely empty
/// selection falls back to the placeholder paper.
pub async fn load_paper(pool: &SqlitePool) -> Result<TestPaper, AppError> {
    let rows = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, prompt, options, correct_option, is_selected, created_at
        FROM questions
        WHERE is_selected = 1
        ORDER BY created_at ASC, id ASC
        LIMIT ?
        "#,
    )
    .bind(TEST_QUESTION_COUNT as i64)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to load test paper: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let questions = rows
        .into_iter()
        .map(|q| PaperQuestion {
            id: q.id.to_string(),
            prompt: q.prompt,
            options: q.options.0,
            correct_option_index: q.correct_option as usize,
        })
        .collect();

    Ok(TestPaper::from_bank(questions))
}
