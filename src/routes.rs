// src/routes.rs

use axum::{
    Router, http::Method,
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, session},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, sessions, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, session store).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:5173".parse().unwrap(),
        "http://localhost:8080".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new().route("/login", post(auth::login));

    // Candidate-facing, no auth; sessions are addressed by random ids.
    let session_routes = Router::new()
        .route("/", post(session::create_session))
        .route("/{id}", get(session::session_status))
        .route("/{id}/paper", get(session::session_paper))
        .route("/{id}/start", post(session::start_session))
        .route("/{id}/answers", post(session::record_answer))
        .route("/{id}/navigate", post(session::navigate_session))
        .route("/{id}/end", post(session::end_session));

    let admin_routes = Router::new()
        .route(
            "/questions",
            get(admin::list_questions).post(admin::create_question),
        )
        .route(
            "/questions/{id}",
            put(admin::update_question).delete(admin::delete_question),
        )
        .route("/questions/{id}/selection", put(admin::set_question_selection))
        .route("/results", get(admin::list_results))
        .route("/results/export", get(admin::export_results))
        .route(
            "/results/{id}",
            put(admin::update_result).delete(admin::delete_result),
        )
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/sessions", session_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
