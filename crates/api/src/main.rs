use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use banamon_cloud::{LocalBlobStore, MemoryBlobStore, S3BlobStore};
use banamon_core::blob::BlobStore;
use banamon_core::inference::InferenceEngine;
use banamon_db::pg::{PgHistoryStore, PgUserDirectory};
use banamon_inference::HttpInferenceEngine;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use banamon_api::app::build_app;
use banamon_api::config::{BlobBackend, InferenceBackend, ServerConfig};
use banamon_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    init_tracing();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        project_id = %config.project_id,
        model_version = %config.model_version,
        "Loaded server configuration"
    );

    // --- Database ---
    let pool = banamon_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    banamon_db::health_check(&pool)
        .await
        .context("Database health check failed")?;

    banamon_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Blob store ---
    let blob_store = build_blob_store(&config).await;
    tracing::info!(backend = blob_store.backend(), "Blob store ready");

    // --- Inference engine ---
    let engine = build_engine(&config).await?;
    tracing::info!(
        backend = engine.backend(),
        loaded = engine.is_loaded(),
        "Inference engine ready"
    );

    // --- App state ---
    let state = AppState::new(
        config.clone(),
        Arc::new(PgUserDirectory::new(pool.clone())),
        Arc::new(PgHistoryStore::new(pool.clone())),
        blob_store,
        engine,
    );
    let app = build_app(state).context("Invalid CORS origin")?;

    // --- Start server ---
    let host = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST address '{}'", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped accepting connections, closing database pool");
    pool.close().await;
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Install the global subscriber. `LOG_FORMAT=json` selects JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "banamon_api=debug,banamon_pipeline=debug,banamon_inference=info,tower_http=debug".into()
    });
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_blob_store(config: &ServerConfig) -> Arc<dyn BlobStore> {
    match &config.blob {
        BlobBackend::S3(settings) => {
            tracing::info!(bucket = %settings.bucket, region = %settings.region, "Using S3 blob store");
            Arc::new(S3BlobStore::connect(settings, config.credentials.as_ref()).await)
        }
        BlobBackend::Local { root } => {
            tracing::info!(root = %root.display(), "Using local blob store");
            Arc::new(LocalBlobStore::new(root.clone()))
        }
        BlobBackend::Memory => {
            tracing::warn!("Using in-memory blob store; images are lost on restart");
            Arc::new(MemoryBlobStore::new())
        }
    }
}

async fn build_engine(config: &ServerConfig) -> anyhow::Result<Arc<dyn InferenceEngine>> {
    match &config.inference {
        InferenceBackend::Http { url, model_name } => {
            let engine = HttpInferenceEngine::new(
                url,
                model_name,
                Duration::from_secs(config.request_timeout_secs),
            )?;
            if !engine.probe().await {
                // /health re-probes and reports 503 until the model server is up.
                tracing::warn!(%url, %model_name, "Model is not available yet");
            }
            Ok(Arc::new(engine))
        }
        #[cfg(feature = "tensorflow")]
        InferenceBackend::TensorFlow { model_path } => {
            let path = model_path.clone();
            let engine = tokio::task::spawn_blocking(move || {
                banamon_inference::TensorFlowEngine::load(
                    &path,
                    banamon_inference::frozen_graph::DEFAULT_INPUT_OP,
                    banamon_inference::frozen_graph::DEFAULT_OUTPUT_OP,
                )
            })
            .await??;
            Ok(Arc::new(engine))
        }
        #[cfg(not(feature = "tensorflow"))]
        InferenceBackend::TensorFlow { .. } => {
            anyhow::bail!("INFERENCE_BACKEND=tensorflow requires building with the `tensorflow` feature")
        }
    }
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
