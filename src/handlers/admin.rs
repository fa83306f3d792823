// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    config::{MARKS_PER_QUESTION, TEST_QUESTION_COUNT},
    error::AppError,
    models::{
        question::{CreateQuestionRequest, Question, SelectionRequest, UpdateQuestionRequest},
        result::{EmployeeResult, UpdateResultRequest},
    },
    utils::html::clean_html,
};

/// Lists the whole question bank, answers included, in paper order.
/// Admin only.
pub async fn list_questions(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, prompt, options, correct_option, is_selected, created_at
        FROM questions
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(questions))
}

/// Creates a new question in the bank.
///
/// Prompt and options are sanitized before storage so stored markup is
/// safe to render. New questions start unselected.
/// Admin only.
pub async fn create_question(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.correct_option >= payload.options.len() {
        return Err(AppError::BadRequest(
            "correct_option must index one of the options".to_string(),
        ));
    }

    let prompt = clean_html(&payload.prompt);
    let options: Vec<String> = payload.options.iter().map(|o| clean_html(o)).collect();

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO questions (prompt, options, correct_option, is_selected, created_at)
        VALUES (?, ?, ?, 0, ?)
        RETURNING id
        "#,
    )
    .bind(&prompt)
    .bind(SqlJson(options))
    .bind(payload.correct_option as i64)
    .bind(chrono::Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Updates a question by ID. Fields are optional; provided markup is
/// sanitized and the correct index is checked against whichever option
/// list the row ends up with.
/// Admin only.
pub async fn update_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let existing = sqlx::query_as::<_, Question>(
        "SELECT id, prompt, options, correct_option, is_selected, created_at FROM questions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Question not found".to_string()))?;

    if payload.prompt.is_none() && payload.options.is_none() && payload.correct_option.is_none() {
        return Ok(StatusCode::OK);
    }

    // Bounds-check the effective correct index against the effective
    // option list before touching the row.
    let option_count = payload
        .options
        .as_ref()
        .map(|o| o.len())
        .unwrap_or(existing.options.0.len());
    let correct_option = payload
        .correct_option
        .unwrap_or(existing.correct_option as usize);
    if correct_option >= option_count {
        return Err(AppError::BadRequest(
            "correct_option must index one of the options".to_string(),
        ));
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE questions SET ");
    let mut separated = builder.separated(", ");

    if let Some(prompt) = payload.prompt {
        separated.push("prompt = ");
        separated.push_bind_unseparated(clean_html(&prompt));
    }

    if let Some(options) = payload.options {
        let options: Vec<String> = options.iter().map(|o| clean_html(o)).collect();
        separated.push("options = ");
        separated.push_bind_unseparated(SqlJson(options));
    }

    if let Some(correct_option) = payload.correct_option {
        separated.push("correct_option = ");
        separated.push_bind_unseparated(correct_option as i64);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(StatusCode::OK)
}

/// Deletes a question by ID.
/// Admin only.
pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Toggles a question's membership in the live paper.
///
/// Selecting is refused once the paper is full; the check and the flag
/// flip happen in one statement so concurrent selections cannot push
/// the paper past the cap.
/// Admin only.
pub async fn set_question_selection(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<SelectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.selected {
        let result = sqlx::query(
            r#"
            UPDATE questions SET is_selected = 1
            WHERE id = ?
              AND (SELECT COUNT(*) FROM questions WHERE is_selected = 1 AND id != ?) < ?
            "#,
        )
        .bind(id)
        .bind(id)
        .bind(TEST_QUESTION_COUNT as i64)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to select question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE id = ?")
                .bind(id)
                .fetch_one(&pool)
                .await?;
            if exists == 0 {
                return Err(AppError::NotFound("Question not found".to_string()));
            }
            return Err(AppError::BadRequest(format!(
                "At most {} questions can be selected for the test",
                TEST_QUESTION_COUNT
            )));
        }
    } else {
        let result = sqlx::query("UPDATE questions SET is_selected = 0 WHERE id = ?")
            .bind(id)
            .execute(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to deselect question: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Question not found".to_string()));
        }
    }

    Ok(StatusCode::OK)
}

/// Lists all results in serial order.
/// Admin only.
pub async fn list_results(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let results = sqlx::query_as::<_, EmployeeResult>(
        r#"
        SELECT id, serial_number, name, gender, position, total_score, submitted_at
        FROM results
        ORDER BY serial_number ASC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list results: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(results))
}

/// Corrects a result record. Fields are optional.
/// Admin only.
pub async fn update_result(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateResultRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.name.is_none() && payload.position.is_none() && payload.total_score.is_none() {
        return Ok(StatusCode::OK);
    }

    if let Some(total_score) = payload.total_score {
        let max = TEST_QUESTION_COUNT as i64 * MARKS_PER_QUESTION as i64;
        if !(0..=max).contains(&total_score) {
            return Err(AppError::BadRequest(format!(
                "total_score must be between 0 and {}",
                max
            )));
        }
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE results SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
    }

    if let Some(position) = payload.position {
        separated.push("position = ");
        separated.push_bind_unseparated(position);
    }

    if let Some(total_score) = payload.total_score {
        separated.push("total_score = ");
        separated.push_bind_unseparated(total_score);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update result: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Result not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a result record by ID.
/// Admin only.
pub async fn delete_result(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM results WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete result: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Result not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Exports all results as a CSV attachment, in serial order, with the
/// same columns the results table shows.
/// Admin only.
pub async fn export_results(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let results = sqlx::query_as::<_, EmployeeResult>(
        r#"
        SELECT id, serial_number, name, gender, position, total_score, submitted_at
        FROM results
        ORDER BY serial_number ASC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to export results: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let max_marks = TEST_QUESTION_COUNT as u32 * MARKS_PER_QUESTION;
    let mut csv =
        String::from("Serial Number,Name,Gender,Position Applying For,Time Submitted,Total Marks\n");
    for r in &results {
        let fields = [
            r.serial_number.to_string(),
            r.name.clone(),
            r.gender.clone(),
            r.position.clone(),
            r.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            format!("{}/{}", r.total_score, max_marks),
        ];
        let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    let filename = format!(
        "employee_results_{}.csv",
        chrono::Utc::now().format("%Y-%m-%d")
    );
    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];

    Ok((headers, csv))
}

/// Quotes a CSV field when it contains a comma, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
