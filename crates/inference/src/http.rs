//! [`InferenceEngine`] that delegates to a model server over HTTP.
//!
//! Speaks the TensorFlow Serving REST API:
//!
//! ```text
//! GET  {base}/v1/models/{name}           -> model_version_status[].state
//! POST {base}/v1/models/{name}:predict   {"instances": [HxWxC]} -> {"predictions": [[p0..pN]]}
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use banamon_core::inference::{ImageTensor, InferenceEngine, InferenceError};
use serde::{Deserialize, Serialize};

/// Model server state that means the model can serve predictions.
const AVAILABLE_STATE: &str = "AVAILABLE";

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: [Vec<Vec<&'a [f32]>>; 1],
}

#[derive(Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct ModelStatusResponse {
    #[serde(default)]
    model_version_status: Vec<ModelVersionStatus>,
}

#[derive(Deserialize)]
struct ModelVersionStatus {
    state: String,
}

/// Client for a remote model server.
pub struct HttpInferenceEngine {
    client: reqwest::Client,
    status_url: String,
    predict_url: String,
    loaded: AtomicBool,
}

impl HttpInferenceEngine {
    /// Build a client for model `model_name` served at `base_url`.
    ///
    /// Does not contact the server; call [`probe`](Self::probe) to load state.
    pub fn new(base_url: &str, model_name: &str, timeout: Duration) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceError::Failed(format!("Failed to build HTTP client: {e}")))?;

        let base = base_url.trim_end_matches('/');
        Ok(Self {
            client,
            status_url: format!("{base}/v1/models/{model_name}"),
            predict_url: format!("{base}/v1/models/{model_name}:predict"),
            loaded: AtomicBool::new(false),
        })
    }

    /// Ask the server whether a model version is available and record the answer.
    pub async fn probe(&self) -> bool {
        let available = match self.fetch_status().await {
            Ok(status) => status
                .model_version_status
                .iter()
                .any(|v| v.state == AVAILABLE_STATE),
            Err(e) => {
                tracing::warn!(url = %self.status_url, error = %e, "Model status probe failed");
                false
            }
        };
        self.loaded.store(available, Ordering::Release);
        available
    }

    async fn fetch_status(&self) -> Result<ModelStatusResponse, reqwest::Error> {
        self.client
            .get(&self.status_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait]
impl InferenceEngine for HttpInferenceEngine {
    async fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        if !self.is_loaded() && !self.probe().await {
            return Err(InferenceError::NotLoaded);
        }
        if !input.is_consistent() {
            return Err(InferenceError::Failed(
                "Input tensor size does not match its shape".into(),
            ));
        }

        let channels = input.channels as usize;
        let row_len = input.width as usize * channels;
        let rows: Vec<Vec<&[f32]>> = input
            .data
            .chunks_exact(row_len)
            .map(|row| row.chunks_exact(channels).collect())
            .collect();
        let body = PredictRequest { instances: [rows] };

        let response = self
            .client
            .post(&self.predict_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::Failed(e.to_string()))?
            .error_for_status()
            .map_err(|e| InferenceError::Failed(e.to_string()))?;

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::MalformedOutput(e.to_string()))?;

        parsed
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::MalformedOutput("Empty predictions array".into()))
    }

    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    async fn check_loaded(&self) -> bool {
        self.probe().await
    }

    fn backend(&self) -> &'static str {
        "http"
    }
}
