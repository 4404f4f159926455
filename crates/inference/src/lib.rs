//! Model-facing code: image preprocessing and [`InferenceEngine`] backends.
//!
//! - [`preprocess`] -- decode JPEG/PNG bytes into the model's input tensor.
//! - [`http::HttpInferenceEngine`] -- a remote model server speaking the
//!   TensorFlow Serving REST protocol.
//! - `frozen_graph::TensorFlowEngine` -- in-process execution of a frozen
//!   graph (requires the `tensorflow` feature).
//!
//! [`InferenceEngine`]: banamon_core::inference::InferenceEngine

pub mod http;
pub mod preprocess;
#[cfg(feature = "tensorflow")]
pub mod frozen_graph;

pub use http::HttpInferenceEngine;
pub use preprocess::{decode_and_normalize, PreprocessError};
#[cfg(feature = "tensorflow")]
pub use frozen_graph::TensorFlowEngine;
