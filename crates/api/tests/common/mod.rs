#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use banamon_api::app::build_app;
use banamon_api::auth::jwt::JwtConfig;
use banamon_api::config::{BlobBackend, InferenceBackend, ServerConfig};
use banamon_api::state::AppState;
use banamon_cloud::MemoryBlobStore;
use banamon_core::blob::BlobStore;
use banamon_core::inference::{ImageTensor, InferenceEngine, InferenceError};
use banamon_db::memory::{InMemoryHistoryStore, InMemoryUserDirectory};
use banamon_db::{HistoryStore, UserDirectory};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tower::ServiceExt;

pub const TEST_MODEL_VERSION: &str = "test-1.0";
pub const TEST_PROJECT_ID: &str = "banamon-test";
pub const TEST_PASSWORD: &str = "pw123456";

/// Multipart boundary used by [`post_multipart`].
const BOUNDARY: &str = "banamon-test-boundary";

// ---------------------------------------------------------------------------
// Fake inference engine
// ---------------------------------------------------------------------------

/// Deterministic engine returning fixed scores.
pub struct FakeEngine {
    pub scores: Vec<f32>,
    pub loaded: AtomicBool,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeEngine {
    /// Scores favoring "Banana Healthy Leaf" (index 2).
    pub fn healthy() -> Self {
        Self::with_scores(vec![0.01, 0.02, 0.91, 0.02, 0.01, 0.02, 0.01])
    }

    pub fn with_scores(scores: Vec<f32>) -> Self {
        Self {
            scores,
            loaded: AtomicBool::new(true),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceEngine for FakeEngine {
    async fn predict(&self, _input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(InferenceError::Failed("fake engine failure".into()));
        }
        Ok(self.scores.clone())
    }

    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    fn backend(&self) -> &'static str {
        "fake"
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: "postgres://unused".to_string(),
        project_id: TEST_PROJECT_ID.to_string(),
        credentials: None,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        blob: BlobBackend::Memory,
        inference: InferenceBackend::Http {
            url: "http://unused".to_string(),
            model_name: "banana_disease".to_string(),
        },
        model_version: TEST_MODEL_VERSION.to_string(),
        max_upload_bytes: 1024 * 1024,
    }
}

/// Handles to the collaborators behind a test app, for assertions.
pub struct TestApp {
    pub router: Router,
    pub users: Arc<InMemoryUserDirectory>,
    pub history: Arc<InMemoryHistoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub engine: Arc<FakeEngine>,
}

impl TestApp {
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application (same middleware stack as production) over
/// in-memory stores and a fake engine.
pub fn build_test_app() -> TestApp {
    build_test_app_with(
        Arc::new(FakeEngine::healthy()),
        Arc::new(MemoryBlobStore::new()),
    )
}

pub fn build_test_app_with(engine: Arc<FakeEngine>, blobs: Arc<MemoryBlobStore>) -> TestApp {
    let users = Arc::new(InMemoryUserDirectory::new());
    let history = Arc::new(InMemoryHistoryStore::new());
    let router = build_router(
        test_config(),
        users.clone(),
        history.clone(),
        blobs.clone(),
        engine.clone(),
    );
    TestApp {
        router,
        users,
        history,
        blobs,
        engine,
    }
}

/// Build the application from arbitrary collaborators.
pub fn build_router(
    config: ServerConfig,
    users: Arc<dyn UserDirectory>,
    history: Arc<dyn HistoryStore>,
    blobs: Arc<dyn BlobStore>,
    engine: Arc<dyn InferenceEngine>,
) -> Router {
    let state = AppState::new(config, users, history, blobs, engine);
    build_app(state).unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// One part of a multipart body.
pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    /// A part under the `file` field name.
    pub fn file(file_name: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
        Self {
            name: "file",
            file_name: Some(file_name),
            content_type: Some(content_type),
            data,
        }
    }
}

/// Encode parts as a `multipart/form-data` body.
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(file_name) = part.file_name {
            disposition.push_str(&format!("; filename=\"{file_name}\""));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(
    app: Router,
    uri: &str,
    token: Option<&str>,
    parts: &[Part<'_>],
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = builder.body(Body::from(multipart_body(parts))).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A small solid-green image encoded as `format`.
pub fn leaf_image(format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(64, 48, Rgb([40, 150, 60]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

pub fn jpeg() -> Vec<u8> {
    leaf_image(ImageFormat::Jpeg)
}

/// Register and log in `email`, returning the login response body.
pub async fn register_and_login(app: &TestApp, email: &str) -> serde_json::Value {
    let creds = serde_json::json!({ "email": email, "password": TEST_PASSWORD });

    let response = post_json(app.router(), "/auth/register", creds.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED, "registration of {email} should succeed");

    let response = post_json(app.router(), "/auth/login", creds).await;
    assert_eq!(response.status(), StatusCode::OK, "login of {email} should succeed");
    body_json(response).await
}

/// Register and log in `email`, returning just the access token.
pub async fn access_token(app: &TestApp, email: &str) -> String {
    register_and_login(app, email).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}
