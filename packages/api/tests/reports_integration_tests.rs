// ABOUTME: Integration tests for report endpoints
// ABOUTME: Report creation, completion, listing, and the delete cascade

mod common;

use common::{create_entry, create_run, create_type, delete, get, post_json, setup_test_server};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

async fn create_report(base_url: &str, body: Value) -> String {
    let response = post_json(base_url, "/api/v1/report", &body).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    body["report_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_report_lifecycle() {
    let ctx = setup_test_server().await;
    let papers = create_type(&ctx.base_url, "papers").await;
    let a = create_entry(&ctx.base_url, &papers, "a").await;
    let b = create_entry(&ctx.base_url, &papers, "b").await;

    let report_id = create_report(
        &ctx.base_url,
        json!({
            "summary": "Weekly digest",
            "markdown_content": "Sources: https://example.com/one and https://example.org/two",
            "entry_ids": [a, b],
        }),
    )
    .await;

    let report: Value = get(&ctx.base_url, &format!("/api/v1/report/{}", report_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(report["status"], "processed");
    assert_eq!(report["sources"]["1"], "https://example.com/one");
    assert_eq!(report["sources"]["2"], "https://example.org/two");
    let entries = report["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e["status"] == "processed"));

    let response = post_json(
        &ctx.base_url,
        &format!("/api/v1/report/{}/done", report_id),
        &json!({}),
    )
    .await;
    assert_eq!(response.status(), 200);

    let report: Value = get(&ctx.base_url, &format!("/api/v1/report/{}", report_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(report["status"], "done");
    assert!(report["entries"]
        .as_array()
        .unwrap()
        .iter()
        .all(|e| e["status"] == "archived"));
}

#[tokio::test]
async fn test_create_report_validation() {
    let ctx = setup_test_server().await;

    let response = post_json(
        &ctx.base_url,
        "/api/v1/report",
        &json!({ "summary": "", "markdown_content": "", "entry_ids": ["entry-1"] }),
    )
    .await;
    assert_eq!(response.status(), 400);

    let response = post_json(
        &ctx.base_url,
        "/api/v1/report",
        &json!({ "summary": "ok", "markdown_content": "", "entry_ids": [] }),
    )
    .await;
    assert_eq!(response.status(), 400);

    let response = post_json(
        &ctx.base_url,
        "/api/v1/report",
        &json!({ "summary": "s", "markdown_content": "m" }),
    )
    .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "entry_ids must not be empty");
}

#[tokio::test]
async fn test_create_report_with_unknown_run_rolls_back() {
    let ctx = setup_test_server().await;
    let papers = create_type(&ctx.base_url, "papers").await;
    let a = create_entry(&ctx.base_url, &papers, "a").await;

    let response = post_json(
        &ctx.base_url,
        "/api/v1/report",
        &json!({
            "summary": "broken",
            "markdown_content": "",
            "entry_ids": [a],
            "run_id": "run-missing",
        }),
    )
    .await;
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);

    let entry: Value = get(&ctx.base_url, &format!("/api/v1/entries/{}", a))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(entry["status"], "pending");
}

#[tokio::test]
async fn test_list_reports_by_status() {
    let ctx = setup_test_server().await;
    let papers = create_type(&ctx.base_url, "papers").await;
    let a = create_entry(&ctx.base_url, &papers, "a").await;
    let b = create_entry(&ctx.base_url, &papers, "b").await;
    let first = create_report(
        &ctx.base_url,
        json!({ "summary": "first", "markdown_content": "", "entry_ids": [a] }),
    )
    .await;
    create_report(
        &ctx.base_url,
        json!({ "summary": "second", "markdown_content": "", "entry_ids": [b] }),
    )
    .await;
    post_json(
        &ctx.base_url,
        &format!("/api/v1/report/{}/done", first),
        &json!({}),
    )
    .await;

    let all: Value = get(&ctx.base_url, "/api/v1/report")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(all.as_array().unwrap().len(), 2);

    let done: Value = get(&ctx.base_url, "/api/v1/report?status=done")
        .await
        .json()
        .await
        .unwrap();
    let done = done.as_array().unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0]["id"], first);
}

#[tokio::test]
async fn test_delete_report_cascades_to_run() {
    let ctx = setup_test_server().await;
    let papers = create_type(&ctx.base_url, "papers").await;
    let a = create_entry(&ctx.base_url, &papers, "a").await;
    let run_id = create_run(&ctx.base_url, &papers, 5).await;
    post_json(
        &ctx.base_url,
        &format!("/api/v1/run/{}/claim", run_id),
        &json!({ "type_id": papers, "limit": 5 }),
    )
    .await;
    let report_id = create_report(
        &ctx.base_url,
        json!({
            "summary": "run report",
            "markdown_content": "",
            "entry_ids": [a],
            "run_id": run_id,
        }),
    )
    .await;

    let response = delete(&ctx.base_url, &format!("/api/v1/report/{}", report_id)).await;
    assert_eq!(response.status(), 200);

    assert_eq!(
        get(&ctx.base_url, &format!("/api/v1/report/{}", report_id))
            .await
            .status(),
        404
    );
    assert_eq!(
        get(&ctx.base_url, &format!("/api/v1/entries/{}", a))
            .await
            .status(),
        404
    );
    assert_eq!(
        get(&ctx.base_url, &format!("/api/v1/run/{}", run_id))
            .await
            .status(),
        404
    );
}

#[tokio::test]
async fn test_missing_report() {
    let ctx = setup_test_server().await;

    assert_eq!(
        get(&ctx.base_url, "/api/v1/report/report-missing")
            .await
            .status(),
        404
    );
    assert_eq!(
        post_json(&ctx.base_url, "/api/v1/report/report-missing/done", &json!({}))
            .await
            .status(),
        404
    );
    assert_eq!(
        delete(&ctx.base_url, "/api/v1/report/report-missing")
            .await
            .status(),
        404
    );
}
