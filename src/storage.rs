use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Lifetime of a presigned upload URL.
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

/// Largest image a client may upload (3 MB).
pub const MAX_UPLOAD_BYTES: u64 = 3 * 1024 * 1024;

/// StorageError
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to presign upload: {0}")]
    Presign(String),

    #[error("mock storage failure")]
    Simulated,
}

// 1. StorageService Contract
/// StorageService
///
/// Abstract contract for the object storage that holds book covers and avatars. Handlers
/// only see this trait, so tests run against `MockStorageService` instead of S3.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the configured bucket if it is missing. Only called for local (MinIO) runs.
    async fn ensure_bucket_exists(&self);

    /// Returns a short-lived URL the client can PUT the image to directly.
    ///
    /// # Arguments
    /// * `key`: The final object key in the bucket.
    /// * `content_type`: The MIME type the upload must declare (e.g. "image/png").
    /// * `content_length`: The exact body size in bytes the upload must send.
    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
        content_length: u64,
    ) -> Result<String, StorageError>;

    /// Publicly reachable URL of a stored object, saved on books and profiles.
    fn public_url(&self, key: &str) -> String;
}

// 2. The Real Implementation (S3/MinIO)
/// S3StorageClient
///
/// Concrete implementation using the AWS SDK for S3. With an endpoint override it talks to
/// a local MinIO container (path-style addressing); without one it talks to AWS directly.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
    region: String,
    endpoint: Option<String>,
}

impl S3StorageClient {
    /// new
    ///
    /// Constructs the S3 client from the credentials in AppConfig.
    pub fn new(
        endpoint: Option<&str>,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let mut builder = s3::Config::builder()
            .credentials_provider(credentials)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest();

        if let Some(endpoint) = endpoint {
            // MinIO only understands http://endpoint/bucket/key.
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: s3::Client::from_conf(builder.build()),
            bucket_name: bucket.to_string(),
            region: region.to_string(),
            endpoint: endpoint.map(|e| e.trim_end_matches('/').to_string()),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// ensure_bucket_exists
    ///
    /// CreateBucket fails harmlessly when the bucket is already there, so the error is
    /// only logged.
    async fn ensure_bucket_exists(&self) {
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!("create_bucket({}) skipped: {:?}", self.bucket_name, e);
        }
    }

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
        content_length: u64,
    ) -> Result<String, StorageError> {
        let content_length =
            i64::try_from(content_length).map_err(|e| StorageError::Presign(e.to_string()))?;
        let presigning = PresigningConfig::builder()
            .expires_in(UPLOAD_URL_TTL)
            .build()
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(sanitize_key(key))
            // Content-Type and Content-Length are signed, so the client cannot swap either.
            .content_type(content_type)
            .content_length(content_length)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        Ok(presigned_req.uri().to_string())
    }

    fn public_url(&self, key: &str) -> String {
        let key = sanitize_key(key);
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint, self.bucket_name, key),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket_name, self.region, key
            ),
        }
    }
}

/// sanitize_key
///
/// Removes directory navigation components (`..`, `.`) and empty segments from a
/// user-influenced object key.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

// 3. The Mock Implementation (For Tests)
/// MockStorageService
///
/// Deterministic `StorageService` for tests; no network access.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, presigning fails.
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        _content_type: &str,
        _content_length: u64,
    ) -> Result<String, StorageError> {
        if self.should_fail {
            return Err(StorageError::Simulated);
        }

        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitize_key(key)
        ))
    }

    fn public_url(&self, key: &str) -> String {
        format!("http://localhost:9000/mock-bucket/{}", sanitize_key(key))
    }
}

/// StorageState
///
/// The concrete type used to share the storage service across the application state.
pub type StorageState = Arc<dyn StorageService>;
