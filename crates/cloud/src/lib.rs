//! Cloud-facing collaborators: blob storage backends and the credential file.
//!
//! - [`s3::S3BlobStore`] -- S3-compatible object storage (AWS, GCS interop, MinIO).
//! - [`local::LocalBlobStore`] -- a directory on the local filesystem.
//! - [`memory::MemoryBlobStore`] -- process memory, for tests and demos.
//! - [`credentials::CredentialFile`] -- secrets read once at startup.

pub mod credentials;
pub mod local;
pub mod memory;
pub mod s3;

pub use credentials::{CredentialError, CredentialFile};
pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
pub use s3::{S3BlobStore, S3Settings};
