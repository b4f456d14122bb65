// ABOUTME: Common test utilities for integration tests
// ABOUTME: Provides test server setup, seeding helpers, and HTTP client utilities

use collector_api::{create_app, DbState};
use collector_runs::{HttpWorkflowWebhook, WebhookConfig, WorkflowWebhook};
use collector_storage::{connect, DatabaseConfig};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Test context containing server URL and database pool
pub struct TestContext {
    pub base_url: String,
    #[allow(dead_code)]
    pub pool: SqlitePool,
}

/// Create a test server with an isolated in-memory database and no webhook
pub async fn setup_test_server() -> TestContext {
    setup_with_webhook(None).await
}

/// Create a test server whose runs trigger the webhook at `url`
#[allow(dead_code)]
pub async fn setup_test_server_with_webhook(url: &str) -> TestContext {
    let webhook = HttpWorkflowWebhook::new(WebhookConfig::new(url))
        .expect("Failed to build webhook client");
    setup_with_webhook(Some(Arc::new(webhook))).await
}

async fn setup_with_webhook(webhook: Option<Arc<dyn WorkflowWebhook>>) -> TestContext {
    let pool = connect(&DatabaseConfig::in_memory())
        .await
        .expect("Failed to create database pool");

    let app = create_app(DbState::new(pool.clone(), webhook));

    // Bind to random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestContext { base_url, pool }
}

/// Helper to make GET requests
#[allow(dead_code)]
pub async fn get(base_url: &str, path: &str) -> reqwest::Response {
    reqwest::Client::new()
        .get(format!("{}{}", base_url, path))
        .send()
        .await
        .expect("Failed to make GET request")
}

/// Helper to make POST requests with JSON body
#[allow(dead_code)]
pub async fn post_json<T: serde::Serialize>(
    base_url: &str,
    path: &str,
    body: &T,
) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}{}", base_url, path))
        .json(body)
        .send()
        .await
        .expect("Failed to make POST request")
}

/// Helper to make PATCH requests with JSON body
#[allow(dead_code)]
pub async fn patch_json<T: serde::Serialize>(
    base_url: &str,
    path: &str,
    body: &T,
) -> reqwest::Response {
    reqwest::Client::new()
        .patch(format!("{}{}", base_url, path))
        .json(body)
        .send()
        .await
        .expect("Failed to make PATCH request")
}

/// Helper to make DELETE requests
#[allow(dead_code)]
pub async fn delete(base_url: &str, path: &str) -> reqwest::Response {
    reqwest::Client::new()
        .delete(format!("{}{}", base_url, path))
        .send()
        .await
        .expect("Failed to make DELETE request")
}

/// Create a type and return its id
#[allow(dead_code)]
pub async fn create_type(base_url: &str, name: &str) -> String {
    let response = post_json(base_url, "/api/v1/types", &json!({ "name": name })).await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

/// Create one pending entry of `type_id` and return its id
#[allow(dead_code)]
pub async fn create_entry(base_url: &str, type_id: &str, content: &str) -> String {
    let response = post_json(
        base_url,
        "/api/v1/entries",
        &json!({ "content": content, "type_ids": [type_id] }),
    )
    .await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    body[0]["id"].as_str().unwrap().to_string()
}

/// Create a run and return its id
#[allow(dead_code)]
pub async fn create_run(base_url: &str, type_id: &str, limit: i64) -> String {
    let response = post_json(
        base_url,
        "/api/v1/run",
        &json!({ "name": "batch", "type_id": type_id, "limit_count": limit }),
    )
    .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    body["run_id"].as_str().unwrap().to_string()
}
