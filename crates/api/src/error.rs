use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use banamon_core::error::CoreError;
use banamon_db::StoreError;
use banamon_pipeline::PipelineError;
use serde_json::{json, Value};

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain errors of the library crates and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent
/// `{"error", "code"}` JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, extra) = match self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Store(err) => classify_core_error(err.into()),
            AppError::Pipeline(err) => classify_pipeline_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let (Some(Value::Object(extra)), Value::Object(map)) = (extra, &mut body) {
            map.extend(extra);
        }

        (status, axum::Json(body)).into_response()
    }
}

type Classified = (StatusCode, &'static str, String, Option<Value>);

fn internal() -> Classified {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
        None,
    )
}

fn classify_core_error(err: CoreError) -> Classified {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
            None,
        ),
        CoreError::Validation(msg) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_ERROR",
            msg,
            None,
        ),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg, None),
        CoreError::ServiceUnavailable(msg) => {
            tracing::error!(error = %msg, "Dependency unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "A required service is temporarily unavailable".to_string(),
                None,
            )
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// Input failures are the caller's to fix; everything after the blob write
/// is a server-side failure.
fn classify_pipeline_error(err: PipelineError) -> Classified {
    match err {
        PipelineError::InvalidUpload(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
        PipelineError::InvalidImage(e) => {
            (StatusCode::BAD_REQUEST, "BAD_REQUEST", e.to_string(), None)
        }
        PipelineError::BlobWrite(e) => {
            tracing::error!(error = %e, "Image storage failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "Image storage is temporarily unavailable".to_string(),
                None,
            )
        }
        PipelineError::HistoryWrite {
            classification,
            image_key,
            source,
        } => {
            tracing::error!(error = %source, %image_key, "Prediction history write failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "HISTORY_WRITE_FAILED",
                "Classification succeeded but the prediction could not be saved".to_string(),
                Some(json!({
                    "classification": classification,
                    "image_key": image_key,
                })),
            )
        }
        err @ (PipelineError::Inference(_)
        | PipelineError::MalformedOutput(_)
        | PipelineError::Internal(_)) => {
            tracing::error!(error = %err, "Prediction failed");
            internal()
        }
    }
}
