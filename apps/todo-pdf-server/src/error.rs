//! Error types for the todo PDF server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use render_pool::PoolError;
use report_engine::RenderError;
use serde::Serialize;
use shared_types::ValidationError;
use thiserror::Error;

/// Top-level error for `POST /pdf` responses
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Render(String),

    #[error("Render timed out after {0}ms")]
    Timeout(u64),
}

/// 400 body
#[derive(Serialize)]
struct InvalidRequestResponse {
    error: String,
}

/// 500 body
#[derive(Serialize)]
struct RenderFailureResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::InvalidRequest(_) => {
                tracing::debug!("Rejected request: {}", self);
                let body = InvalidRequestResponse {
                    error: self.to_string(),
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ServerError::Render(_) | ServerError::Timeout(_) => {
                tracing::error!("PDF generation failed: {}", self);
                let body = RenderFailureResponse {
                    error: "Failed to generate PDF",
                    message: self.to_string(),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl From<ValidationError> for ServerError {
    fn from(err: ValidationError) -> Self {
        ServerError::InvalidRequest(err.to_string())
    }
}

impl From<PoolError<RenderError>> for ServerError {
    fn from(err: PoolError<RenderError>) -> Self {
        match err {
            // Panic payloads stay in the logs
            PoolError::Panicked { slot, message } => {
                tracing::error!("Render slot {} panicked: {}", slot, message);
                ServerError::Render("Render worker crashed".to_string())
            }
            other => {
                if let Some(RenderError::Compile(diagnostics)) = other.job_error() {
                    for diagnostic in diagnostics.iter().filter(|d| d.hint.is_some()) {
                        tracing::debug!(
                            "Template diagnostic: {} (hint: {})",
                            diagnostic.message,
                            diagnostic.hint.as_deref().unwrap_or_default()
                        );
                    }
                }
                ServerError::Render(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use report_engine::CompileError;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ServerError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (ServerError::Render("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ServerError::Timeout(5), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_panic_message_is_not_exposed() {
        let err = ServerError::from(PoolError::<RenderError>::Panicked {
            slot: 0,
            message: "index out of bounds: the len is 3".to_string(),
        });

        assert_eq!(err.to_string(), "Render worker crashed");
    }

    #[test]
    fn test_pool_errors_keep_short_message() {
        let err = ServerError::from(PoolError::<RenderError>::Job(RenderError::EmptyDocument));
        assert_eq!(err.to_string(), "Document has no pages");

        let err = ServerError::from(PoolError::<RenderError>::Unavailable);
        assert_eq!(err.to_string(), "No worker slots available");
    }

    #[test]
    fn test_compile_failure_keeps_joined_diagnostics() {
        let err = ServerError::from(PoolError::Job(RenderError::Compile(vec![
            CompileError::new("unknown variable: rows").with_hint("pass rows in sys.inputs"),
        ])));
        assert_eq!(err.to_string(), "Compilation failed: unknown variable: rows");
    }

    #[test]
    fn test_validation_error_prefix() {
        let err = ServerError::from(ValidationError::TodosNotArray);
        assert_eq!(err.to_string(), "Invalid request: 'todos' must be an array");
    }
}
