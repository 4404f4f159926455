use std::sync::Arc;

use banamon_core::blob::BlobStore;
use banamon_core::inference::InferenceEngine;
use banamon_db::{HistoryStore, UserDirectory};
use banamon_pipeline::PredictionPipeline;

use crate::auth::service::AuthService;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; every field is behind an `Arc`. The stores and engine
/// are trait objects so tests can swap in in-memory doubles.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub auth: Arc<AuthService>,
    pub pipeline: Arc<PredictionPipeline>,
    pub history: Arc<dyn HistoryStore>,
    pub blob_store: Arc<dyn BlobStore>,
    pub engine: Arc<dyn InferenceEngine>,
}

impl AppState {
    /// Wire the services from their collaborators.
    pub fn new(
        config: ServerConfig,
        users: Arc<dyn UserDirectory>,
        history: Arc<dyn HistoryStore>,
        blob_store: Arc<dyn BlobStore>,
        engine: Arc<dyn InferenceEngine>,
    ) -> Self {
        let auth = AuthService::new(users, config.jwt.clone());
        let pipeline = PredictionPipeline::new(
            Arc::clone(&blob_store),
            Arc::clone(&engine),
            Arc::clone(&history),
            banamon_pipeline::PipelineConfig {
                model_version: config.model_version.clone(),
                max_upload_bytes: config.max_upload_bytes,
                input_size: banamon_core::inference::MODEL_INPUT_SIZE,
            },
        );

        Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
            pipeline: Arc::new(pipeline),
            history,
            blob_store,
            engine,
        }
    }
}
