// src/session/sink.rs

use sqlx::SqlitePool;

use crate::error::AppError;

use super::machine::ScoredAttempt;

/// Persists a scored attempt as a result row and returns the serial
/// number it was assigned.
///
/// The next serial is computed inside the INSERT itself, so two
/// submissions can never read the same maximum and collide; SQLite
/// serializes writers and the UNIQUE constraint backstops the rest.
/// Failures map to [`AppError::SubmissionFailed`] so callers roll the
/// session back and let the candidate retry.
pub async fn submit_attempt(pool: &SqlitePool, attempt: &ScoredAttempt) -> Result<i64, AppError> {
    let serial_number: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO results (serial_number, name, gender, position, total_score, submitted_at)
        VALUES (
            (SELECT COALESCE(MAX(serial_number), 0) + 1 FROM results),
            ?, ?, ?, ?, ?
        )
        RETURNING serial_number
        "#,
    )
    .bind(&attempt.profile.name)
    .bind(&attempt.profile.gender)
    .bind(&attempt.profile.position)
    .bind(attempt.total_score as i64)
    .bind(chrono::Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::SubmissionFailed(e.to_string()))?;

    Ok(serial_number)
}
