//! Prediction history entity model and DTOs.

use banamon_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// One persisted classification outcome, owned by `user_id`. Immutable.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct PredictionRecord {
    pub id: DbId,
    pub user_id: DbId,
    /// Key of the uploaded image in the blob store. The blob's lifetime is
    /// independent of this record.
    pub image_key: String,
    pub label: String,
    pub confidence: f32,
    pub model_version: String,
    pub created_at: Timestamp,
}

/// DTO for appending a prediction record.
#[derive(Debug, Clone)]
pub struct CreatePrediction {
    pub user_id: DbId,
    pub image_key: String,
    pub label: String,
    pub confidence: f32,
    pub model_version: String,
}
