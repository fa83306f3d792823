// src/models/result.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'results' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EmployeeResult {
    pub id: i64,

    /// Strictly increasing display number assigned at submission time.
    pub serial_number: i64,

    pub name: String,
    pub gender: String,

    /// The position the candidate applied for.
    pub position: String,

    pub total_score: i64,

    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for correcting a result record. All fields optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateResultRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub position: Option<String>,
    pub total_score: Option<i64>,
}
