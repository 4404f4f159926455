//! In-process [`InferenceEngine`] running a frozen TensorFlow graph.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use banamon_core::inference::{
    ImageTensor, InferenceEngine, InferenceError, MODEL_INPUT_CHANNELS, MODEL_INPUT_SIZE,
};
use tensorflow::{Graph, ImportGraphDefOptions, Session, SessionOptions, SessionRunArgs, Tensor};

/// Default name of the graph's input placeholder.
pub const DEFAULT_INPUT_OP: &str = "x";
/// Default name of the graph's softmax output.
pub const DEFAULT_OUTPUT_OP: &str = "Identity";

struct LoadedGraph {
    graph: Graph,
    session: Session,
    input_op: String,
    output_op: String,
}

impl LoadedGraph {
    fn run(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        let tensor = Tensor::<f32>::new(&input.batch_shape())
            .with_values(&input.data)
            .map_err(|e| InferenceError::Failed(e.to_string()))?;

        let input_op = self
            .graph
            .operation_by_name_required(&self.input_op)
            .map_err(|e| InferenceError::Failed(e.to_string()))?;
        let output_op = self
            .graph
            .operation_by_name_required(&self.output_op)
            .map_err(|e| InferenceError::Failed(e.to_string()))?;

        let mut args = SessionRunArgs::new();
        args.add_feed(&input_op, 0, &tensor);
        let token = args.request_fetch(&output_op, 0);
        self.session
            .run(&mut args)
            .map_err(|e| InferenceError::Failed(e.to_string()))?;

        let output: Tensor<f32> = args
            .fetch(token)
            .map_err(|e| InferenceError::MalformedOutput(e.to_string()))?;
        Ok(output.to_vec())
    }
}

/// A frozen graph loaded once and shared across requests.
///
/// `Session::run` is thread-safe; each call runs on the blocking pool.
#[derive(Clone)]
pub struct TensorFlowEngine {
    inner: Arc<LoadedGraph>,
    /// Result of the warm-up run; false means the graph does not fit the model contract.
    loaded: bool,
}

impl TensorFlowEngine {
    /// Load the frozen graph at `path` and run one warm-up inference.
    ///
    /// A graph that imports but fails warm-up (wrong op names or input
    /// shape) is returned with [`is_loaded`](InferenceEngine::is_loaded)
    /// false, so health reports it as unavailable.
    pub fn load(
        path: impl AsRef<Path>,
        input_op: &str,
        output_op: &str,
    ) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            InferenceError::Failed(format!("Failed to read model {}: {e}", path.display()))
        })?;

        let mut graph = Graph::new();
        graph
            .import_graph_def(&bytes, &ImportGraphDefOptions::new())
            .map_err(|e| InferenceError::Failed(format!("Failed to import graph: {e}")))?;
        let session = Session::new(&SessionOptions::new(), &graph)
            .map_err(|e| InferenceError::Failed(format!("Failed to create session: {e}")))?;

        let inner = Arc::new(LoadedGraph {
            graph,
            session,
            input_op: input_op.to_string(),
            output_op: output_op.to_string(),
        });

        let warm_up = ImageTensor {
            height: MODEL_INPUT_SIZE,
            width: MODEL_INPUT_SIZE,
            channels: MODEL_INPUT_CHANNELS,
            data: vec![0.0; (MODEL_INPUT_SIZE * MODEL_INPUT_SIZE * MODEL_INPUT_CHANNELS) as usize],
        };
        let loaded = match inner.run(&warm_up) {
            Ok(_) => {
                tracing::info!(path = %path.display(), "Model warmed up");
                true
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Model warm-up failed");
                false
            }
        };

        Ok(Self { inner, loaded })
    }
}

#[async_trait]
impl InferenceEngine for TensorFlowEngine {
    async fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        let inner = Arc::clone(&self.inner);
        let input = input.clone();
        tokio::task::spawn_blocking(move || inner.run(&input))
            .await
            .map_err(|e| InferenceError::Failed(format!("Inference task failed: {e}")))?
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn backend(&self) -> &'static str {
        "tensorflow"
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn missing_file_fails_to_load() {
        let result = TensorFlowEngine::load("/nonexistent/frozen.pb", DEFAULT_INPUT_OP, DEFAULT_OUTPUT_OP);
        assert_matches!(result, Err(InferenceError::Failed(_)));
    }

    #[tokio::test]
    async fn graph_without_model_ops_is_not_loaded() {
        // An empty GraphDef imports cleanly but has no `x`/`Identity` ops.
        let file = tempfile::NamedTempFile::new().unwrap();

        let engine =
            TensorFlowEngine::load(file.path(), DEFAULT_INPUT_OP, DEFAULT_OUTPUT_OP).unwrap();
        assert!(!engine.is_loaded());
        assert!(!engine.check_loaded().await);
    }
}
