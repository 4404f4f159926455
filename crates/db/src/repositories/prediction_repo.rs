//! Repository for the `predictions` table (append-only).

use banamon_core::types::DbId;
use sqlx::PgPool;

use crate::models::prediction::{CreatePrediction, PredictionRecord};

const COLUMNS: &str = "id, user_id, image_key, label, confidence, model_version, created_at";

/// Provides append and per-user queries for prediction history.
pub struct PredictionRepo;

impl PredictionRepo {
    /// Append a record, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePrediction,
    ) -> Result<PredictionRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO predictions (user_id, image_key, label, confidence, model_version)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PredictionRecord>(&query)
            .bind(input.user_id)
            .bind(&input.image_key)
            .bind(&input.label)
            .bind(input.confidence)
            .bind(&input.model_version)
            .fetch_one(pool)
            .await
    }

    /// List a user's records, most recent first. `limit = None` returns all.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: DbId,
        limit: Option<i64>,
    ) -> Result<Vec<PredictionRecord>, sqlx::Error> {
        // LIMIT NULL is LIMIT ALL in PostgreSQL.
        let query = format!(
            "SELECT {COLUMNS} FROM predictions
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, PredictionRecord>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
