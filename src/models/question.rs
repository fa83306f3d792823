// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'questions' table in the database (the question bank).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// The text content of the question. May carry sanitized rich markup.
    pub prompt: String,

    /// Ordered list of option texts (2 to 5 entries).
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// Zero-based index into `options` of the correct answer.
    pub correct_option: i64,

    /// Whether this question is part of the live test paper.
    pub is_selected: bool,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for sending a paper question to candidates (excludes the answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    pub prompt: String,
    pub options: Vec<String>,
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    pub correct_option: usize,
}

/// DTO for updating an existing question. All fields optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub prompt: Option<String>,
    #[validate(custom(function = validate_options))]
    pub options: Option<Vec<String>>,
    pub correct_option: Option<usize>,
}

/// DTO for toggling a question's membership in the live paper.
#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub selected: bool,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() < 2 || options.len() > 5 {
        return Err(validator::ValidationError::new("options_count_out_of_range"));
    }
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}
