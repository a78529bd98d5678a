//! API handlers for the todo PDF server

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use render_pool::PoolStatus;
use report_engine::RenderJob;
use serde::Serialize;
use serde_json::Value;
use shared_types::parse_todo_payload;
use tracing::{debug, info};

use crate::error::ServerError;
use crate::storage;
use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub pool: PoolStatus,
}

/// Handler: GET /health
///
/// Reads pool counters from the dispatcher; never waits on a slot.
pub async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let pool = state.pool.status().await;
    let status = if pool.accepting && pool.live_slots > 0 {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        service: "todo-pdf-server",
        version: env!("CARGO_PKG_VERSION"),
        pool,
    })
}

#[derive(Serialize)]
pub struct ApiMessage {
    pub message: &'static str,
}

/// Handler: GET /api
pub async fn handle_api() -> Json<ApiMessage> {
    Json(ApiMessage {
        message: "hey from api",
    })
}

/// Handler: POST /pdf
///
/// Validate, hand the render to the pool, then answer with the PDF as an
/// attachment. A copy is saved under the output directory when one is set.
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ServerError> {
    let Json(body) = payload.map_err(|e| ServerError::InvalidRequest(e.body_text()))?;
    let todos = parse_todo_payload(&body)?;

    let count = todos.len();
    let started = Instant::now();
    let handle = state.pool.submit(RenderJob::new(todos));
    debug!("Submitted render job {} ({} todos)", handle.id(), count);

    let rendered = match state.render_timeout {
        Some(limit) => tokio::time::timeout(limit, handle)
            .await
            .map_err(|_| ServerError::Timeout(limit.as_millis() as u64))?,
        None => handle.await,
    }?;

    info!(
        "Rendered {} todos into {} pages in {:?}",
        count,
        rendered.page_count,
        started.elapsed()
    );

    let filename = storage::report_filename(Utc::now());
    if let Some(dir) = &state.output_dir {
        storage::persist(dir, &filename, &rendered.bytes).await;
    }

    Ok(pdf_attachment(&filename, rendered.bytes))
}

fn pdf_attachment(filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_LENGTH, bytes.len().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}
