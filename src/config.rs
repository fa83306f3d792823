// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Number of question slots on one paper; also the admin selection cap.
pub const TEST_QUESTION_COUNT: usize = 25;

/// Marks awarded per correctly answered question.
pub const MARKS_PER_QUESTION: u32 = 2;

/// Countdown length for one test session (30 minutes).
pub const TEST_DURATION_SECS: u32 = 30 * 60;

/// Sessions that sit in one phase for this long without progressing
/// (never started, already submitted, or dead-ended after a failed
/// submission) are reaped from the in-memory store.
pub const SESSION_IDLE_TIMEOUT_SECS: u64 = 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    /// Countdown length handed to new sessions. Defaults to
    /// [`TEST_DURATION_SECS`]; override via env for operational tuning.
    pub test_duration_secs: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://assessment.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let admin_email = env::var("ADMIN_EMAIL").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        let test_duration_secs = env::var("TEST_DURATION_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(TEST_DURATION_SECS);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_email,
            admin_password,
            test_duration_secs,
        }
    }
}
