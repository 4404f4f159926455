//! Inference Engine capability and its input tensor.

use async_trait::async_trait;

/// Width and height the model expects, in pixels.
pub const MODEL_INPUT_SIZE: u32 = 224;

/// Colour channels the model expects (RGB).
pub const MODEL_INPUT_CHANNELS: u32 = 3;

/// A normalized image in row-major HWC layout with values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    pub height: u32,
    pub width: u32,
    pub channels: u32,
    pub data: Vec<f32>,
}

impl ImageTensor {
    /// Shape with a leading batch dimension of one, as models consume it.
    pub fn batch_shape(&self) -> [u64; 4] {
        [1, self.height as u64, self.width as u64, self.channels as u64]
    }

    /// Whether `data` holds exactly `height * width * channels` values.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == (self.height * self.width * self.channels) as usize
    }
}

/// Errors raised by an [`InferenceEngine`].
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The model has not been loaded (or its server reports no version).
    #[error("Model is not loaded")]
    NotLoaded,

    #[error("Inference failed: {0}")]
    Failed(String),

    /// The engine answered but the payload could not be interpreted.
    #[error("Malformed model output: {0}")]
    MalformedOutput(String),
}

/// A loaded classification model.
///
/// Loaded once at startup and shared read-only; implementations must be safe
/// to call concurrently.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Run the model on one image and return one probability per label.
    async fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError>;

    /// Whether the model is loaded and ready to serve, as last observed.
    fn is_loaded(&self) -> bool;

    /// Refresh readiness from the backing runtime and return it.
    ///
    /// Engines whose model lives elsewhere override this to ask again; the
    /// default reports the last observed state.
    async fn check_loaded(&self) -> bool {
        self.is_loaded()
    }

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
