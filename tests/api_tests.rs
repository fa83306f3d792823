// tests/api_tests.rs

use assessment_portal::{
    config::Config, routes, session::store::SessionStore, state::AppState,
    utils::hash::hash_password,
};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "admin-password-123";

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL and a handle to the app's own pool so tests
/// can seed and inspect rows directly.
async fn spawn_app() -> (String, SqlitePool) {
    // One permanent connection keeps the in-memory database alive for
    // the whole test.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    // Seed the admin account the way the server does at startup.
    let password_hash = hash_password(ADMIN_PASSWORD).expect("Failed to hash admin password");
    sqlx::query("INSERT INTO admins (email, password_hash, created_at) VALUES (?, ?, ?)")
        .bind(ADMIN_EMAIL)
        .bind(password_hash)
        .bind(chrono::Utc::now())
        .execute(&pool)
        .await
        .expect("Failed to seed admin");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        admin_email: Some(ADMIN_EMAIL.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        test_duration_secs: 1800,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
        sessions: SessionStore::new(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

/// Logs the seeded admin in and returns the bearer token.
async fn login_admin(client: &reqwest::Client, address: &str) -> String {
    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "email": ADMIN_EMAIL,
            "password": ADMIN_PASSWORD
        }))
        .send()
        .await
        .expect("Login request failed")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login json");

    response["token"]
        .as_str()
        .expect("Token not found")
        .to_string()
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn admin_login_works() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "email": ADMIN_EMAIL,
            "password": ADMIN_PASSWORD
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["type"], "Bearer");
}

#[tokio::test]
async fn admin_login_rejects_wrong_password() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "email": ADMIN_EMAIL,
            "password": "not-the-password"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn admin_routes_reject_missing_or_garbage_token() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let no_token = client
        .get(format!("{}/api/admin/questions", address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(no_token.status().as_u16(), 401);

    let garbage = client
        .get(format!("{}/api/admin/questions", address))
        .header("Authorization", "Bearer not.a.jwt")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(garbage.status().as_u16(), 401);
}

#[tokio::test]
async fn question_crud_flow() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login_admin(&client, &address).await;

    // 1. Create
    let create = client
        .post(format!("{}/api/admin/questions", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "prompt": "Which planet is closest to the sun?",
            "options": ["Venus", "Mercury", "Earth"],
            "correct_option": 1
        }))
        .send()
        .await
        .expect("Create failed");
    assert_eq!(create.status().as_u16(), 201);
    let created: serde_json::Value = create.json().await.unwrap();
    let id = created["id"].as_i64().expect("id missing");

    // 2. List shows the full row, answer included
    let list: Vec<serde_json::Value> = client
        .get(format!("{}/api/admin/questions", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("List failed")
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["prompt"], "Which planet is closest to the sun?");
    assert_eq!(list[0]["correct_option"], 1);
    assert_eq!(list[0]["is_selected"], false);

    // 3. Update the prompt only
    let update = client
        .put(format!("{}/api/admin/questions/{}", address, id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"prompt": "Which planet orbits nearest the sun?"}))
        .send()
        .await
        .expect("Update failed");
    assert_eq!(update.status().as_u16(), 200);

    let list: Vec<serde_json::Value> = client
        .get(format!("{}/api/admin/questions", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("List failed")
        .json()
        .await
        .unwrap();
    assert_eq!(list[0]["prompt"], "Which planet orbits nearest the sun?");
    assert_eq!(list[0]["correct_option"], 1, "untouched fields survive");

    // 4. Delete
    let delete = client
        .delete(format!("{}/api/admin/questions/{}", address, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Delete failed");
    assert_eq!(delete.status().as_u16(), 204);

    let not_found = client
        .delete(format!("{}/api/admin/questions/{}", address, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Delete failed");
    assert_eq!(not_found.status().as_u16(), 404);
}

#[tokio::test]
async fn question_validation_rejections() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login_admin(&client, &address).await;

    // Single option is below the minimum of two.
    let too_few = client
        .post(format!("{}/api/admin/questions", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "prompt": "Lonely?",
            "options": ["only one"],
            "correct_option": 0
        }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(too_few.status().as_u16(), 400);

    // Correct index must point at an option.
    let bad_index = client
        .post(format!("{}/api/admin/questions", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "prompt": "Pick one",
            "options": ["a", "b"],
            "correct_option": 2
        }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(bad_index.status().as_u16(), 400);
}

#[tokio::test]
async fn question_markup_is_sanitized() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login_admin(&client, &address).await;

    let create = client
        .post(format!("{}/api/admin/questions", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "prompt": "Safe <b>bold</b><script>alert(1)</script> prompt",
            "options": ["plain", "<img src=x onerror=alert(1)>spiky"],
            "correct_option": 0
        }))
        .send()
        .await
        .expect("Create failed");
    assert_eq!(create.status().as_u16(), 201);

    let list: Vec<serde_json::Value> = client
        .get(format!("{}/api/admin/questions", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("List failed")
        .json()
        .await
        .unwrap();

    let prompt = list[0]["prompt"].as_str().unwrap();
    assert!(prompt.contains("<b>bold</b>"));
    assert!(!prompt.contains("script"));

    let spiky = list[0]["options"][1].as_str().unwrap();
    assert!(!spiky.contains("onerror"));
    assert!(spiky.contains("spiky"));
}

#[tokio::test]
async fn selection_cap_is_enforced() {
    // Arrange: a bank of 26 questions.
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login_admin(&client, &address).await;

    let mut ids = Vec::new();
    for i in 0..26 {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO questions (prompt, options, correct_option, is_selected, created_at)
            VALUES (?, ?, 0, 0, ?)
            RETURNING id
            "#,
        )
        .bind(format!("Question {}", i))
        .bind(sqlx::types::Json(vec!["a".to_string(), "b".to_string()]))
        .bind(chrono::Utc::now())
        .fetch_one(&pool)
        .await
        .expect("seed question");
        ids.push(id);
    }

    // 25 selections go through.
    for id in &ids[..25] {
        let response = client
            .put(format!("{}/api/admin/questions/{}/selection", address, id))
            .header("Authorization", format!("Bearer {}", token))
            .json(&serde_json::json!({"selected": true}))
            .send()
            .await
            .expect("Select failed");
        assert_eq!(response.status().as_u16(), 200);
    }

    // The 26th is refused.
    let over_cap = client
        .put(format!("{}/api/admin/questions/{}/selection", address, ids[25]))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"selected": true}))
        .send()
        .await
        .expect("Select failed");
    assert_eq!(over_cap.status().as_u16(), 400);

    // Re-selecting an already selected question is not a cap violation.
    let reselect = client
        .put(format!("{}/api/admin/questions/{}/selection", address, ids[0]))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"selected": true}))
        .send()
        .await
        .expect("Select failed");
    assert_eq!(reselect.status().as_u16(), 200);

    // Deselecting frees a slot.
    let deselect = client
        .put(format!("{}/api/admin/questions/{}/selection", address, ids[0]))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"selected": false}))
        .send()
        .await
        .expect("Deselect failed");
    assert_eq!(deselect.status().as_u16(), 200);

    let freed = client
        .put(format!("{}/api/admin/questions/{}/selection", address, ids[25]))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"selected": true}))
        .send()
        .await
        .expect("Select failed");
    assert_eq!(freed.status().as_u16(), 200);

    // Unknown question id.
    let missing = client
        .put(format!("{}/api/admin/questions/999999/selection", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"selected": true}))
        .send()
        .await
        .expect("Select failed");
    assert_eq!(missing.status().as_u16(), 404);
}

/// Seeds one result row directly, the shape the sink writes.
async fn seed_result(pool: &SqlitePool, serial: i64, name: &str, score: i64) {
    sqlx::query(
        r#"
        INSERT INTO results (serial_number, name, gender, position, total_score, submitted_at)
        VALUES (?, ?, 'Female', 'Accountant', ?, ?)
        "#,
    )
    .bind(serial)
    .bind(name)
    .bind(score)
    .bind(chrono::Utc::now())
    .execute(pool)
    .await
    .expect("seed result");
}

#[tokio::test]
async fn results_review_flow() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login_admin(&client, &address).await;

    seed_result(&pool, 2, "Second Candidate", 10).await;
    seed_result(&pool, 1, "First Candidate", 40).await;

    // 1. List comes back in serial order.
    let list: Vec<serde_json::Value> = client
        .get(format!("{}/api/admin/results", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("List failed")
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["serial_number"], 1);
    assert_eq!(list[1]["serial_number"], 2);
    let id = list[0]["id"].as_i64().unwrap();

    // 2. Partial update.
    let update = client
        .put(format!("{}/api/admin/results/{}", address, id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"name": "Corrected Name", "total_score": 42}))
        .send()
        .await
        .expect("Update failed");
    assert_eq!(update.status().as_u16(), 200);

    let list: Vec<serde_json::Value> = client
        .get(format!("{}/api/admin/results", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("List failed")
        .json()
        .await
        .unwrap();
    assert_eq!(list[0]["name"], "Corrected Name");
    assert_eq!(list[0]["total_score"], 42);
    assert_eq!(list[0]["position"], "Accountant", "untouched fields survive");

    // 3. A score past the maximum is refused.
    let bad_score = client
        .put(format!("{}/api/admin/results/{}", address, id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"total_score": 51}))
        .send()
        .await
        .expect("Update failed");
    assert_eq!(bad_score.status().as_u16(), 400);

    // 4. Delete.
    let delete = client
        .delete(format!("{}/api/admin/results/{}", address, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Delete failed");
    assert_eq!(delete.status().as_u16(), 204);

    let missing = client
        .put(format!("{}/api/admin/results/{}", address, id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"name": "ghost"}))
        .send()
        .await
        .expect("Update failed");
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn results_export_produces_csv() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login_admin(&client, &address).await;

    seed_result(&pool, 1, "Doe, Jane", 4).await;

    // Act
    let response = client
        .get(format!("{}/api/admin/results/export", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Export failed");

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/csv"));

    let disposition = response
        .headers()
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.contains("attachment"));
    assert!(disposition.contains("employee_results_"));

    let body = response.text().await.unwrap();
    let mut lines = body.lines();
    assert_eq!(
        lines.next(),
        Some("Serial Number,Name,Gender,Position Applying For,Time Submitted,Total Marks")
    );
    let row = lines.next().expect("data row missing");
    assert!(row.starts_with("1,\"Doe, Jane\",Female,Accountant,"));
    assert!(row.ends_with("4/50"));
}
