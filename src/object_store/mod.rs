mod s3;

pub use self::s3::S3Store;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::io::AsyncRead;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Streamed request body handed through to the backend.
pub type ObjectBody<'a> = Pin<Box<dyn AsyncRead + Send + 'a>>;

/// One entry of a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Abstraction over S3-style object storage backends.
/// Nothing is cached; every call is a round trip to the backend.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObjectStoreError>;
    async fn make_bucket(&self, bucket: &str) -> Result<(), ObjectStoreError>;
    /// Returns the number of bytes written.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: ObjectBody<'_>,
    ) -> Result<u64, ObjectStoreError>;
    /// Objects in the order the backend enumerates them.
    async fn list(&self, bucket: &str) -> Result<Vec<ObjectInfo>, ObjectStoreError>;
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, ObjectStoreError>;
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError>;
}
