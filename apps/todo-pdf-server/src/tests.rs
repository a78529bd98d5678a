//! Router-level tests for the todo PDF server
//!
//! Every test runs a real render pool so the full request path is
//! exercised, from JSON validation to PDF bytes.

use std::path::Path;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use render_pool::{PoolConfig, WorkerPool};
use report_engine::ReportWorker;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{app, AppState};

struct TestServer {
    router: Router,
    pool: WorkerPool<ReportWorker>,
    output: TempDir,
    _static_dir: TempDir,
}

async fn test_server(size: usize, persist: bool, render_timeout: Option<Duration>) -> TestServer {
    let pool = WorkerPool::start(PoolConfig::with_size(size), ReportWorker::new)
        .await
        .unwrap();
    let output = tempfile::tempdir().unwrap();
    let static_dir = tempfile::tempdir().unwrap();
    std::fs::write(static_dir.path().join("index.html"), "<h1>Todos</h1>").unwrap();

    let state = AppState {
        pool: pool.clone(),
        output_dir: persist.then(|| output.path().join("pdfs")),
        render_timeout,
    };

    TestServer {
        router: app(state, static_dir.path()),
        pool,
        output,
        _static_dir: static_dir,
    }
}

fn pdf_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/pdf")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn saved_reports(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir.join("pdfs")) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn sample_todos(count: i64) -> Value {
    let todos: Vec<Value> = (1..=count)
        .map(|id| json!({ "id": id, "text": format!("Task {}", id), "completed": id % 2 == 0 }))
        .collect();
    json!({ "todos": todos })
}

// ============================================================
// Health and static routes
// ============================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_health_reports_pool() {
    let server = test_server(2, false, None).await;

    let response = server.router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "todo-pdf-server");
    assert_eq!(body["pool"]["slots"], 2);
    assert_eq!(body["pool"]["live_slots"], 2);
    assert_eq!(body["pool"]["accepting"], true);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_api_message() {
    let server = test_server(1, false, None).await;

    let response = server.router.oneshot(get("/api")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "message": "hey from api" }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_index_is_served() {
    let server = test_server(1, false, None).await;

    let response = server.router.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"<h1>Todos</h1>");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_answers_while_pool_is_saturated() {
    let server = test_server(1, false, None).await;

    let mut renders = Vec::new();
    for _ in 0..3 {
        let router = server.router.clone();
        let request = pdf_request(sample_todos(400).to_string());
        renders.push(tokio::spawn(async move { router.oneshot(request).await }));
    }

    // Wait until all three requests reached the pool
    for _ in 0..200 {
        if server.pool.status().await.queued == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let response = tokio::time::timeout(
        Duration::from_secs(2),
        server.router.clone().oneshot(get("/health")),
    )
    .await
    .expect("health should answer while renders run")
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["pool"]["busy"], 1);
    assert_eq!(body["pool"]["queued"], 2);

    for render in renders {
        let response = render.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

// ============================================================
// POST /pdf
// ============================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_generate_pdf_success() {
    let server = test_server(1, true, None).await;

    let response = server
        .router
        .clone()
        .oneshot(pdf_request(sample_todos(3).to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");

    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"todos-"));
    assert!(disposition.ends_with(".pdf\""));

    let bytes = body_bytes(response).await;
    assert_eq!(
        headers[header::CONTENT_LENGTH].to_str().unwrap(),
        bytes.len().to_string()
    );
    let document = lopdf::Document::load_mem(&bytes).expect("valid PDF");
    assert_eq!(document.get_pages().len(), 1);

    let saved = saved_reports(server.output.path());
    assert_eq!(saved.len(), 1);
    assert!(disposition.contains(&saved[0]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_todo_list_renders() {
    let server = test_server(1, false, None).await;

    let response = server
        .router
        .oneshot(pdf_request(json!({ "todos": [] }).to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.starts_with(b"%PDF"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_no_copy_when_persistence_disabled() {
    let server = test_server(1, false, None).await;

    let response = server
        .router
        .oneshot(pdf_request(sample_todos(1).to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(saved_reports(server.output.path()).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_payloads_are_rejected_before_the_pool() {
    let server = test_server(1, true, None).await;

    let bodies = [
        "not json".to_string(),
        json!([]).to_string(),
        json!({}).to_string(),
        json!({ "todos": "many" }).to_string(),
        json!({ "todos": [{ "id": "1", "text": "a", "completed": false }] }).to_string(),
        json!({ "todos": [{ "id": 1, "completed": false }] }).to_string(),
    ];

    for body in bodies {
        let response = server
            .router
            .clone()
            .oneshot(pdf_request(body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);

        let json = body_json(response).await;
        let error = json["error"].as_str().unwrap_or_default();
        assert!(error.starts_with("Invalid request"), "error: {}", error);
    }

    let status = server.pool.status().await;
    assert_eq!(status.completed + status.failed, 0);
    assert!(saved_reports(server.output.path()).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_content_type_is_rejected() {
    let server = test_server(1, false, None).await;

    let request = Request::builder()
        .method("POST")
        .uri("/pdf")
        .body(Body::from(sample_todos(1).to_string()))
        .unwrap();

    let response = server.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_render_timeout_returns_500() {
    let server = test_server(1, true, Some(Duration::from_millis(1))).await;

    let response = server
        .router
        .oneshot(pdf_request(sample_todos(200).to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Failed to generate PDF");
    assert!(json["message"].as_str().unwrap().contains("timed out"));
    assert!(saved_reports(server.output.path()).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_closed_pool_returns_500() {
    let server = test_server(1, false, None).await;
    server.pool.shutdown().await;

    let response = server
        .router
        .oneshot(pdf_request(sample_todos(1).to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Failed to generate PDF");
    assert_eq!(json["message"], "Worker pool is shut down");
}
