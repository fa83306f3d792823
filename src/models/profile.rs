// src/models/profile.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Candidate details collected before the test begins.
///
/// Captured once when the session is created and carried on the session
/// itself; the core never reads it back except to stamp the result record.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CandidateProfile {
    #[validate(length(min = 1, max = 100, message = "Name is required."))]
    pub name: String,

    #[validate(length(min = 1, max = 20, message = "Gender is required."))]
    pub gender: String,

    /// The position the candidate is applying for.
    #[validate(length(min = 1, max = 100, message = "Position is required."))]
    pub position: String,
}
