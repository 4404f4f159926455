//! Liveness and readiness endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Configuration was loaded. Always true once the server is serving.
    pub config: bool,
    pub model_loaded: bool,
    pub database: bool,
    pub blob_store: bool,
}

/// Health check response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, `degraded`, or `unavailable`.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub model_version: String,
    pub project_id: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

/// GET /health
///
/// The model is the only critical dependency: without it the service cannot
/// answer predictions and reports 503. An unreachable database or blob store
/// degrades the status but keeps 200. Model readiness is re-checked on every
/// call so a model that finishes loading (or goes away) after startup is
/// reported. No inference is run.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (model_loaded, database, blob_store) = tokio::join!(
        state.engine.check_loaded(),
        state.history.health_check(),
        state.blob_store.health_check()
    );
    let checks = HealthChecks {
        config: true,
        model_loaded,
        database: database.is_ok(),
        blob_store: blob_store.is_ok(),
    };

    let (code, status) = if !checks.model_loaded {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    } else if !checks.database || !checks.blob_store {
        (StatusCode::OK, "degraded")
    } else {
        (StatusCode::OK, "ok")
    };
    if status != "ok" {
        tracing::warn!(status, ?checks, "Health check not ok");
    }

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            model_version: state.config.model_version.clone(),
            project_id: state.config.project_id.clone(),
            checks,
        }),
    )
}

/// GET /
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Banana leaf disease prediction API",
        version: env!("CARGO_PKG_VERSION"),
        status: "online",
    })
}
