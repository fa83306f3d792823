// src/handlers/auth.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::admin::{AdminUser, LoginRequest},
    utils::{hash::verify_password, jwt::sign_jwt},
};

/// Authenticates an admin and returns a JWT token.
///
/// Verifies the email and password against the seeded admin accounts.
/// The same error is returned for an unknown email and a wrong
/// password, so the response does not reveal which accounts exist.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let admin = sqlx::query_as::<_, AdminUser>(
        r#"
        SELECT id, email, password_hash, created_at
        FROM admins
        WHERE email = ?
        "#,
    )
    .bind(&payload.email)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let admin = admin.ok_or(AppError::AuthError(
        "Invalid email or password".to_string(),
    ))?;

    let is_valid = verify_password(&payload.password, &admin.password_hash)?;

    if !is_valid {
        return Err(AppError::AuthError("Invalid email or password".to_string()));
    }

    let token = sign_jwt(
        admin.id,
        "admin",
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer"
    })))
}
