use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use super::{Failure, FileEntry, FileListing, Message, OpResult, StorageApi, UploadedFile};
use crate::object_store::{ObjectStore, ObjectStoreError};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// [`StorageApi`] over any S3-protocol store. Shared by every backend
/// identifier, since they all speak the same wire protocol.
pub struct S3Api {
    store: Arc<dyn ObjectStore>,
}

impl S3Api {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<Message, ObjectStoreError> {
        if self.store.bucket_exists(bucket).await? {
            return Ok(Message::new(format!("Bucket '{bucket}' already exists")));
        }

        self.store.make_bucket(bucket).await?;
        tracing::info!(bucket, "Created bucket");
        Ok(Message::new(format!("Bucket '{bucket}' created successfully")))
    }
}

#[async_trait]
impl StorageApi for S3Api {
    async fn create_bucket(&self, bucket: &str) -> OpResult<Message> {
        self.ensure_bucket(bucket).await.map_err(|e| {
            tracing::warn!(bucket, error = %e, "Failed to create bucket");
            Failure::from_store("creating bucket", e)
        })
    }

    async fn list_files(&self, bucket: &str) -> OpResult<FileListing> {
        let exists = self.store.bucket_exists(bucket).await.map_err(|e| {
            tracing::warn!(bucket, error = %e, "Failed to check bucket");
            Failure::from_store("listing files", e)
        })?;
        if !exists {
            return Err(Failure::not_found(format!(
                "Bucket '{bucket}' does not exist"
            )));
        }

        let objects = self.store.list(bucket).await.map_err(|e| {
            tracing::warn!(bucket, error = %e, "Failed to list files");
            Failure::from_store("listing files", e)
        })?;

        let files = objects
            .into_iter()
            .map(|obj| FileEntry {
                name: obj.key,
                size: obj.size,
                last_modified: obj.last_modified,
            })
            .collect();

        Ok(FileListing {
            bucket: bucket.to_string(),
            files,
        })
    }

    async fn upload_file(&self, bucket: &str, file: UploadedFile<'_>) -> OpResult<Message> {
        let UploadedFile {
            filename,
            content_type,
            body,
        } = file;

        if filename.is_empty() {
            return Err(Failure::invalid_input(
                "Error uploading file: uploaded file has no filename",
            ));
        }

        // Trust the declared type unless it is missing or the generic fallback.
        let content_type = content_type
            .filter(|ct| ct != FALLBACK_CONTENT_TYPE)
            .or_else(|| mime_guess::from_path(&filename).first().map(|m| m.to_string()))
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

        let written = self
            .store
            .put(bucket, &filename, &content_type, body)
            .await
            .map_err(|e| {
                tracing::warn!(bucket, key = %filename, error = %e, "Failed to upload file");
                Failure::from_store("uploading file", e)
            })?;

        tracing::debug!(bucket, key = %filename, bytes = written, "Uploaded file");
        Ok(Message::new(format!(
            "File '{filename}' uploaded successfully to bucket '{bucket}'"
        )))
    }

    async fn download_file(&self, bucket: &str, filename: &str) -> OpResult<Bytes> {
        self.store.get(bucket, filename).await.map_err(|e| {
            tracing::warn!(bucket, key = filename, error = %e, "Failed to download file");
            Failure::from_store("downloading file", e)
        })
    }

    async fn delete_file(&self, bucket: &str, filename: &str) -> OpResult<Message> {
        self.store.delete(bucket, filename).await.map_err(|e| {
            tracing::warn!(bucket, key = filename, error = %e, "Failed to delete file");
            Failure::from_store("deleting file", e)
        })?;

        tracing::debug!(bucket, key = filename, "Deleted file");
        Ok(Message::new(format!(
            "File '{filename}' deleted successfully from bucket '{bucket}'"
        )))
    }
}
