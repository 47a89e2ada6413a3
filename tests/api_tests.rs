// tests/api_tests.rs

use sqlx::postgres::PgPoolOptions;
use study_tracker::{config::Config, routes, state::AppState};

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    // Note: For Postgres, you must have a running database.
    // We'll read from DATABASE_URL environment variable.
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    // 1. Create a pool
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    // 2. Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    // 3. Create test configuration and state
    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
    };

    let state = AppState { pool, config };

    // 4. Create the router with the app state
    let app = routes::create_router(state);

    // 5. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 6. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn unique_username() -> String {
    format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8])
}

/// Registers a fresh user and returns (username, bearer token).
async fn register_and_login(client: &reqwest::Client, address: &str) -> (String, String) {
    let username = unique_username();
    let password = "password123";

    let resp = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": username,
            "password": password,
            "confirm_password": password
        }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(resp.status().as_u16(), 201);

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    let token = login["token"].as_str().expect("Token not found").to_string();
    (username, token)
}

async fn add_exam(
    client: &reqwest::Client,
    address: &str,
    token: &str,
    name: &str,
    grade: i64,
    credits: i64,
) -> reqwest::Response {
    client
        .post(format!("{}/api/exams", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "name": name,
            "grade": grade,
            "credits": credits,
            "date": "2024-01-15T00:00:00Z"
        }))
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
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
async fn register_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Password below the 4-character minimum
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": unique_username(),
            "password": "abc",
            "confirm_password": "abc"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);

    // Confirmation mismatch
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": unique_username(),
            "password": "password123",
            "confirm_password": "password124"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_username_is_conflict() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let username = unique_username();

    let body = serde_json::json!({
        "username": username,
        "password": "password123",
        "confirm_password": "password123"
    });

    let first = client
        .post(format!("{}/api/auth/register", address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(format!("{}/api/auth/register", address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn login_failure_is_generic() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (username, _token) = register_and_login(&client, &address).await;

    // Wrong password for an existing user
    let wrong_password: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "username": username,
            "password": "not-the-password"
        }))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    // Unknown user entirely
    let unknown_resp = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "username": unique_username(),
            "password": "not-the-password"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(unknown_resp.status().as_u16(), 401);
    let unknown: serde_json::Value = unknown_resp.json().await.unwrap();

    // The two failures must be indistinguishable to the caller
    assert_eq!(wrong_password["error"], unknown["error"]);
}

#[tokio::test]
async fn exams_require_authentication() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/exams", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn duplicate_subject_leaves_records_unchanged() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (_username, token) = register_and_login(&client, &address).await;

    let created = add_exam(&client, &address, &token, "Analisi 1", 28, 9).await;
    assert_eq!(created.status().as_u16(), 201);

    // Second record for the same subject must be rejected
    let duplicate = add_exam(&client, &address, &token, "Analisi 1", 30, 6).await;
    assert_eq!(duplicate.status().as_u16(), 409);

    let exams: Vec<serde_json::Value> = client
        .get(format!("{}/api/exams", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    assert_eq!(exams.len(), 1);
    assert_eq!(exams[0]["grade"], 28);
}

#[tokio::test]
async fn listing_is_idempotent() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (_username, token) = register_and_login(&client, &address).await;

    add_exam(&client, &address, &token, "Fisica 1", 26, 6).await;
    add_exam(&client, &address, &token, "Geometria", 24, 9).await;

    let mut snapshots = Vec::new();
    for _ in 0..2 {
        let exams: Vec<serde_json::Value> = client
            .get(format!("{}/api/exams", address))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .unwrap();
        snapshots.push(exams);
    }

    assert_eq!(snapshots[0], snapshots[1]);
    assert_eq!(snapshots[0].len(), 2);
}

#[tokio::test]
async fn delete_missing_exam_is_a_noop() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (_username, token) = register_and_login(&client, &address).await;

    add_exam(&client, &address, &token, "Algebra", 27, 6).await;

    let response: serde_json::Value = client
        .delete(format!("{}/api/exams/999999999", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    assert_eq!(response["deleted"], false);

    // Listing is unchanged afterwards
    let exams: Vec<serde_json::Value> = client
        .get(format!("{}/api/exams", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    assert_eq!(exams.len(), 1);
}

#[tokio::test]
async fn delete_existing_exam_works() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (_username, token) = register_and_login(&client, &address).await;

    let exam: serde_json::Value = add_exam(&client, &address, &token, "Chimica", 22, 6)
        .await
        .json()
        .await
        .unwrap();
    let exam_id = exam["id"].as_i64().unwrap();

    let response: serde_json::Value = client
        .delete(format!("{}/api/exams/{}", address, exam_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    assert_eq!(response["deleted"], true);
}

#[tokio::test]
async fn dashboard_empty_state() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (_username, token) = register_and_login(&client, &address).await;

    let dashboard: serde_json::Value = client
        .get(format!("{}/api/dashboard", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    assert!(dashboard["stats"].is_null());
    assert!(dashboard["chart"].is_null());
    assert_eq!(dashboard["simulation"].as_array().unwrap().len(), 0);
    assert!(dashboard["message"].is_string());
}

#[tokio::test]
async fn dashboard_simulation_keeps_full_precision() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (_username, token) = register_and_login(&client, &address).await;

    // Weighted mean 455/16 = 28.4375: the KPI shows 28.44, but the
    // simulation must start from the exact value or the candidate-30
    // 6-credit cell drifts from 28.86 to 28.87.
    add_exam(&client, &address, &token, "Analisi 2", 28, 10).await;
    add_exam(&client, &address, &token, "Fisica 2", 29, 5).await;
    add_exam(&client, &address, &token, "Laboratorio", 30, 1).await;

    let dashboard: serde_json::Value = client
        .get(format!("{}/api/dashboard", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    assert_eq!(dashboard["stats"]["weighted_mean"], 28.44);

    let simulation = dashboard["simulation"].as_array().unwrap();
    assert_eq!(simulation[12]["grade"], "30");
    assert_eq!(simulation[12]["with_6_credits"], 28.86);
}

#[tokio::test]
async fn dashboard_computes_career_statistics() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (_username, token) = register_and_login(&client, &address).await;

    // The worked example: (30, 9 CFU) and (24, 6 CFU)
    add_exam(&client, &address, &token, "Analisi 1", 30, 9).await;
    add_exam(&client, &address, &token, "Programmazione", 24, 6).await;

    let dashboard: serde_json::Value = client
        .get(format!("{}/api/dashboard", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    let stats = &dashboard["stats"];
    assert_eq!(stats["arithmetic_mean"], 27.0);
    assert_eq!(stats["weighted_mean"], 28.4);
    assert_eq!(stats["graduation_projection"], 104.13);
    assert_eq!(stats["total_credits"], 15);

    // Chart series present, with the weighted mean as reference
    assert_eq!(dashboard["chart"]["reference"], 28.4);
    assert_eq!(dashboard["chart"]["points"].as_array().unwrap().len(), 2);

    // Simulation table: 14 rows, last one is the lode case from the spec sheet
    let simulation = dashboard["simulation"].as_array().unwrap();
    assert_eq!(simulation.len(), 14);
    assert_eq!(simulation[0]["grade"], "18");
    assert_eq!(simulation[13]["grade"], "30L");
    assert_eq!(simulation[13]["with_6_credits"], 28.86);
}
