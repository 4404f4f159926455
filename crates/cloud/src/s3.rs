//! S3-compatible [`BlobStore`] backed by `aws-sdk-s3`.
//!
//! Works against AWS S3 and any S3-interoperable endpoint (Google Cloud
//! Storage XML API, MinIO) when `endpoint_url` is set.

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use banamon_core::blob::{validate_key, BlobError, BlobStore};
use bytes::Bytes;

use crate::credentials::CredentialFile;

/// Connection settings for [`S3BlobStore`].
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible services. Enables path-style addressing.
    pub endpoint_url: Option<String>,
}

/// Blob store writing objects into a single bucket.
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    /// Build a client from the default AWS credential chain, overridden by
    /// static keys from the credential file when present.
    pub async fn connect(settings: &S3Settings, credentials: Option<&CredentialFile>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()));

        if let Some((key_id, secret)) = credentials.and_then(CredentialFile::storage_keys) {
            tracing::info!("Using static storage credentials from credential file");
            loader = loader.credentials_provider(Credentials::new(
                key_id,
                secret,
                None,
                None,
                "banamon-credential-file",
            ));
        }

        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &settings.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: settings.bucket.clone(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), BlobError> {
        validate_key(key)?;
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| BlobError::Unavailable(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(bucket = %self.bucket, key, size, "Uploaded object");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, BlobError> {
        validate_key(key)?;
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(SdkError::ServiceError(err)) if err.err().is_no_such_key() => return Ok(None),
            Err(e) => return Err(BlobError::Unavailable(DisplayErrorContext(&e).to_string())),
        };

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| BlobError::Unavailable(e.to_string()))?;
        Ok(Some(data.into_bytes()))
    }

    async fn health_check(&self) -> Result<(), BlobError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| BlobError::Unavailable(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "s3"
    }
}
