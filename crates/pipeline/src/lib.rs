//! The authenticated prediction pipeline.
//!
//! One call to [`PredictionPipeline::run`] takes an already-authenticated
//! user id and an uploaded file through these steps, strictly in order:
//!
//! ```text
//! validate -> decode & normalize -> persist blob -> infer -> persist record
//! ```
//!
//! Input errors are caught before any external call. Once the blob is
//! written it is never rolled back; a later failure leaves it orphaned and
//! logs its key. The pipeline holds no mutable state, so concurrent calls
//! are independent.

mod error;

use std::sync::Arc;

use banamon_core::blob::BlobStore;
use banamon_core::blob_key::generate_blob_key;
use banamon_core::error::CoreError;
use banamon_core::inference::{InferenceEngine, InferenceError, MODEL_INPUT_SIZE};
use banamon_core::labels::{self, Classification};
use banamon_core::types::DbId;
use banamon_core::upload::{validate_upload, DEFAULT_MAX_UPLOAD_BYTES};
use banamon_db::models::prediction::{CreatePrediction, PredictionRecord};
use banamon_db::HistoryStore;
use banamon_inference::decode_and_normalize;
use bytes::Bytes;
use chrono::Utc;

pub use error::PipelineError;

/// Settings fixed at startup.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Version tag stamped on every record.
    pub model_version: String,
    pub max_upload_bytes: usize,
    /// Square edge length of the model input, in pixels.
    pub input_size: u32,
}

impl PipelineConfig {
    pub fn new(model_version: impl Into<String>) -> Self {
        Self {
            model_version: model_version.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            input_size: MODEL_INPUT_SIZE,
        }
    }
}

/// One uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Result of a fully successful run.
#[derive(Debug, Clone)]
pub struct PredictionOutcome {
    pub record: PredictionRecord,
    pub classification: Classification,
}

/// Composes the blob store, inference engine and history store.
pub struct PredictionPipeline {
    blob_store: Arc<dyn BlobStore>,
    engine: Arc<dyn InferenceEngine>,
    history: Arc<dyn HistoryStore>,
    config: PipelineConfig,
}

impl PredictionPipeline {
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        engine: Arc<dyn InferenceEngine>,
        history: Arc<dyn HistoryStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            blob_store,
            engine,
            history,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every step for one upload owned by `user_id`.
    #[tracing::instrument(skip_all, fields(user_id = user_id))]
    pub async fn run(&self, user_id: DbId, upload: Upload) -> Result<PredictionOutcome, PipelineError> {
        tracing::info!(
            file_name = upload.file_name.as_deref().unwrap_or("<none>"),
            size = upload.bytes.len(),
            "Prediction request received"
        );

        let result = self.execute(user_id, upload).await;
        if let Err(e) = &result {
            tracing::warn!(step = e.step(), error = %e, "Prediction failed");
        }
        result
    }

    async fn execute(&self, user_id: DbId, upload: Upload) -> Result<PredictionOutcome, PipelineError> {
        // Validate input.
        validate_upload(
            upload.content_type.as_deref(),
            upload.file_name.as_deref(),
            upload.bytes.len(),
            self.config.max_upload_bytes,
        )
        .map_err(|e| match e {
            CoreError::Validation(msg) => PipelineError::InvalidUpload(msg),
            other => PipelineError::Internal(other.to_string()),
        })?;

        // Decode & normalize.
        let size = self.config.input_size;
        let bytes = upload.bytes.clone();
        let (kind, tensor) = tokio::task::spawn_blocking(move || decode_and_normalize(&bytes, size))
            .await
            .map_err(|e| PipelineError::Internal(format!("Decode task failed: {e}")))??;

        // Persist blob.
        let image_key = generate_blob_key(user_id, Utc::now(), kind);
        self.blob_store
            .put(&image_key, upload.bytes, kind.content_type())
            .await
            .map_err(PipelineError::BlobWrite)?;
        tracing::debug!(%image_key, backend = self.blob_store.backend(), "Image stored");

        // Infer. The blob stays in place on failure.
        let classification = self.infer(&tensor).await.inspect_err(|_| {
            tracing::warn!(%image_key, "Leaving orphaned blob after inference failure");
        })?;
        tracing::debug!(
            label = classification.label,
            confidence = classification.confidence,
            "Classification complete"
        );

        // Persist record.
        let input = CreatePrediction {
            user_id,
            image_key: image_key.clone(),
            label: classification.label.to_string(),
            confidence: classification.confidence,
            model_version: self.config.model_version.clone(),
        };
        let record = match self.history.append(&input).await {
            Ok(record) => record,
            Err(source) => {
                tracing::warn!(%image_key, "Leaving orphaned blob after history write failure");
                return Err(PipelineError::HistoryWrite {
                    classification,
                    image_key,
                    source,
                });
            }
        };

        tracing::info!(
            prediction_id = record.id,
            label = %record.label,
            confidence = record.confidence,
            "Prediction recorded"
        );
        Ok(PredictionOutcome {
            record,
            classification,
        })
    }

    async fn infer(
        &self,
        tensor: &banamon_core::inference::ImageTensor,
    ) -> Result<Classification, PipelineError> {
        let scores = self.engine.predict(tensor).await.map_err(|e| match e {
            InferenceError::MalformedOutput(msg) => PipelineError::MalformedOutput(msg),
            other => PipelineError::Inference(other),
        })?;
        labels::classify(&scores).map_err(|e| PipelineError::MalformedOutput(e.to_string()))
    }
}
