//! Domain building blocks for the banana-leaf disease service.
//!
//! Nothing in this crate performs I/O. It holds the error taxonomy, the
//! fixed label set, input rules, and the capability traits that the storage
//! and inference crates implement.

pub mod blob;
pub mod blob_key;
pub mod credentials;
pub mod error;
pub mod inference;
pub mod labels;
pub mod types;
pub mod upload;
