//! The bucket/file operations exposed to the HTTP layer.
//!
//! Every operation returns an [`OpResult`]: either its success payload or a
//! [`Failure`] carrying a human-readable message. Backend error types never
//! cross this boundary.

mod s3_api;
pub mod selector;

pub use s3_api::S3Api;
pub use selector::select;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::object_store::{ObjectBody, ObjectStoreError};

pub type OpResult<T> = Result<T, Failure>;

/// Where a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    Backend,
    InvalidInput,
}

/// A structured operation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::NotFound,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::InvalidInput,
            message: message.into(),
        }
    }

    /// Wrap a store error raised while `action` was in progress,
    /// e.g. `Failure::from_store("listing files", e)`.
    pub fn from_store(action: &str, e: ObjectStoreError) -> Self {
        let kind = match e {
            ObjectStoreError::NotFound(_) => FailureKind::NotFound,
            ObjectStoreError::InvalidInput(_) => FailureKind::InvalidInput,
            ObjectStoreError::Backend(_) | ObjectStoreError::Io(_) => FailureKind::Backend,
        };
        Self {
            kind,
            message: format!("Error {action}: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileListing {
    pub bucket: String,
    pub files: Vec<FileEntry>,
}

/// A file received from a caller, streamed through to the backend.
pub struct UploadedFile<'a> {
    pub filename: String,
    /// Declared content type, if the caller sent one.
    pub content_type: Option<String>,
    pub body: ObjectBody<'a>,
}

/// Uniform bucket/file operations over one configured backend.
#[async_trait]
pub trait StorageApi: Send + Sync {
    /// Idempotent: an existing bucket is reported, not recreated.
    async fn create_bucket(&self, bucket: &str) -> OpResult<Message>;
    async fn list_files(&self, bucket: &str) -> OpResult<FileListing>;
    async fn upload_file(&self, bucket: &str, file: UploadedFile<'_>) -> OpResult<Message>;
    async fn download_file(&self, bucket: &str, filename: &str) -> OpResult<Bytes>;
    async fn delete_file(&self, bucket: &str, filename: &str) -> OpResult<Message>;
}
