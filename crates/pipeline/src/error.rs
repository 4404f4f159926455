use banamon_core::blob::BlobError;
use banamon_core::inference::InferenceError;
use banamon_core::labels::Classification;
use banamon_db::StoreError;
use banamon_inference::PreprocessError;

/// Terminal failure states of one prediction request.
///
/// Variants before [`BlobWrite`](Self::BlobWrite) leave no side effects.
/// Later variants leave the uploaded blob in place.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Missing file, disallowed type, or size out of bounds.
    #[error("{0}")]
    InvalidUpload(String),

    /// Bytes could not be decoded as a supported image.
    #[error("Invalid image: {0}")]
    InvalidImage(#[from] PreprocessError),

    #[error("Failed to store image: {0}")]
    BlobWrite(#[source] BlobError),

    #[error("Inference failed: {0}")]
    Inference(#[source] InferenceError),

    /// The engine answered with something that is not a distribution over
    /// the label set.
    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    /// Classification succeeded but the history record could not be written.
    #[error("Classification succeeded but saving history failed: {source}")]
    HistoryWrite {
        classification: Classification,
        image_key: String,
        #[source]
        source: StoreError,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Stable name of the step that failed, for logs.
    pub fn step(&self) -> &'static str {
        match self {
            Self::InvalidUpload(_) => "validate",
            Self::InvalidImage(_) => "decode",
            Self::BlobWrite(_) => "persist_blob",
            Self::Inference(_) | Self::MalformedOutput(_) => "infer",
            Self::HistoryWrite { .. } => "persist_record",
            Self::Internal(_) => "internal",
        }
    }
}
