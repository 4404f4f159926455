//! Handler for `POST /predict`.

use axum::extract::State;
use axum::Json;
use banamon_core::labels;
use banamon_core::types::{DbId, Timestamp};
use banamon_pipeline::{PredictionOutcome, Upload};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::extract::UploadForm;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction_id: DbId,
    pub label: String,
    pub confidence: f32,
    pub is_healthy: bool,
    pub description: &'static str,
    pub image_key: String,
    pub model_version: String,
    pub created_at: Timestamp,
}

impl From<PredictionOutcome> for PredictionResponse {
    fn from(outcome: PredictionOutcome) -> Self {
        let record = outcome.record;
        Self {
            prediction_id: record.id,
            is_healthy: outcome.classification.is_healthy(),
            description: labels::description(outcome.classification.label),
            label: record.label,
            confidence: record.confidence,
            image_key: record.image_key,
            model_version: record.model_version,
            created_at: record.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /predict
///
/// Accepts a multipart form with exactly one `file` field holding a JPEG or
/// PNG image, classifies it and records the result in the caller's history.
pub async fn predict(
    State(state): State<AppState>,
    auth_user: AuthUser,
    UploadForm(mut multipart): UploadForm,
) -> AppResult<Json<DataResponse<PredictionResponse>>> {
    let mut upload: Option<Upload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue; // ignore unknown fields
        }
        if upload.is_some() {
            return Err(AppError::BadRequest(
                "Exactly one 'file' field is allowed".into(),
            ));
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        upload = Some(Upload {
            file_name,
            content_type,
            bytes,
        });
    }

    let upload =
        upload.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;

    let outcome = state.pipeline.run(auth_user.user_id, upload).await?;
    Ok(Json(DataResponse {
        data: outcome.into(),
    }))
}
