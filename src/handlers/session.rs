// src/handlers/session.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::{Config, MARKS_PER_QUESTION},
    error::AppError,
    models::{profile::CandidateProfile, question::PublicQuestion},
    session::{
        machine::{Direction, EndOutcome, SelectOutcome, TestSession},
        paper::load_paper,
        sink,
        store::{SessionStore, SharedSession},
    },
};

/// Shown to every candidate behind the instructions gate.
const TEST_INSTRUCTIONS: [&str; 10] = [
    "Read each question carefully before selecting your answer.",
    "Each question carries 2 marks for a total of 50 marks.",
    "You have 30 minutes to complete all 25 questions.",
    "Once you start the test, the timer cannot be paused.",
    "You can change your answers before submitting the test.",
    "Ensure stable internet connection throughout the test.",
    "Do not refresh or close the browser during the test.",
    "Click 'End Test' only when you're ready to submit.",
    "No external help or resources are allowed during the test.",
    "Review your answers before final submission.",
];

fn lookup(sessions: &SessionStore, id: &Uuid) -> Result<SharedSession, AppError> {
    sessions
        .get(id)
        .ok_or(AppError::NotFound("Session not found".to_string()))
}

/// Creates a new test session for a candidate.
///
/// Loads the live paper (or the placeholder paper when the bank has
/// nothing selected), builds a gated session around the candidate's
/// profile and registers it with its ticker. The countdown does not
/// run until the candidate dismisses the instructions.
pub async fn create_session(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    State(sessions): State<SessionStore>,
    Json(payload): Json<CandidateProfile>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let paper = load_paper(&pool).await?;
    let question_count = paper.len();
    let duration_seconds = config.test_duration_secs;

    let id = Uuid::new_v4();
    let session = TestSession::new(payload, paper, duration_seconds);
    sessions.insert(id, session, pool);

    tracing::info!("Created test session {} ({} questions)", id, question_count);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "session_id": id,
            "question_count": question_count,
            "duration_seconds": duration_seconds,
            "marks_per_question": MARKS_PER_QUESTION,
            "instructions": TEST_INSTRUCTIONS,
        })),
    ))
}

/// Returns the session's current phase, clock and progress.
/// `serial_number` is null until the attempt has been persisted.
pub async fn session_status(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = lookup(&sessions, &id)?;
    let guard = session.lock().await;

    Ok(Json(json!({
        "phase": guard.phase(),
        "remaining_seconds": guard.remaining_seconds(),
        "position": guard.position(),
        "question_count": guard.question_count(),
        "answered_count": guard.answered_count(),
        "serial_number": guard.serial_number(),
    })))
}

/// Returns the session's questions without the correct answers.
pub async fn session_paper(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = lookup(&sessions, &id)?;
    let guard = session.lock().await;

    let questions: Vec<PublicQuestion> = guard
        .paper()
        .questions()
        .iter()
        .map(|q| PublicQuestion {
            id: q.id.clone(),
            prompt: q.prompt.clone(),
            options: q.options.clone(),
        })
        .collect();

    Ok(Json(questions))
}

/// Dismisses the instructions gate and starts the countdown.
pub async fn start_session(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = lookup(&sessions, &id)?;
    let mut guard = session.lock().await;

    guard.start();

    Ok(Json(json!({
        "phase": guard.phase(),
        "remaining_seconds": guard.remaining_seconds(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub position: usize,
    pub option_index: usize,
}

/// Records the candidate's choice for one question.
///
/// Out-of-range positions or option indices are rejected; a session
/// that is not Active ignores the request and reports its phase.
pub async fn record_answer(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = lookup(&sessions, &id)?;
    let mut guard = session.lock().await;

    match guard.select_option(payload.position, payload.option_index) {
        SelectOutcome::Recorded => Ok(Json(json!({
            "recorded": true,
            "phase": guard.phase(),
            "answered_count": guard.answered_count(),
        }))),
        SelectOutcome::OutOfRange => Err(AppError::BadRequest(
            "Position or option index out of range".to_string(),
        )),
        SelectOutcome::Ignored => Ok(Json(json!({
            "recorded": false,
            "phase": guard.phase(),
            "answered_count": guard.answered_count(),
        }))),
    }
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub direction: Direction,
}

/// Moves the candidate one question forward or back, clamped at the
/// ends of the paper.
pub async fn navigate_session(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NavigateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = lookup(&sessions, &id)?;
    let mut guard = session.lock().await;

    let position = guard.navigate(payload.direction);

    Ok(Json(json!({
        "position": position,
        "phase": guard.phase(),
    })))
}

/// Ends the test and persists the scored attempt.
///
/// Accepted from the last question, or from anywhere once time has run
/// out (the retry path after a failed automatic submission). If the
/// sink rejects the attempt the session rolls back to Active and the
/// error surfaces to the candidate, who can simply end again.
pub async fn end_session(
    State(pool): State<SqlitePool>,
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = lookup(&sessions, &id)?;
    let mut guard = session.lock().await;

    match guard.end_test() {
        EndOutcome::Submitting(attempt) => match sink::submit_attempt(&pool, &attempt).await {
            Ok(serial_number) => {
                guard.complete_submission(serial_number);
                tracing::info!("Session {} submitted with serial {}", id, serial_number);
                Ok(Json(json!({
                    "ended": true,
                    "serial_number": serial_number,
                    "total_score": attempt.total_score,
                    "max_score": guard.max_score(),
                })))
            }
            Err(e) => {
                guard.fail_submission();
                Err(e)
            }
        },
        EndOutcome::NotEligible => Ok(Json(json!({
            "ended": false,
            "phase": guard.phase(),
            "position": guard.position(),
            "remaining_seconds": guard.remaining_seconds(),
        }))),
    }
}
