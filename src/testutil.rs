//! Shared test helpers: an in-memory object store and router state.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::io::AsyncReadExt;

use crate::config::{Backend, Config, ConnectionProfile, ServerConfig};
use crate::gateway::S3Api;
use crate::object_store::{ObjectBody, ObjectInfo, ObjectStore, ObjectStoreError};
use crate::AppState;

struct StoredObject {
    data: Bytes,
    content_type: String,
    info: ObjectInfo,
}

/// In-memory [`ObjectStore`] with switchable fault injection.
#[derive(Default)]
pub struct MemoryStore {
    buckets: Mutex<HashMap<String, BTreeMap<String, StoredObject>>>,
    failing: AtomicBool,
    buckets_made: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every call fails with a backend error.
    pub fn fail_next_calls(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn buckets_made(&self) -> usize {
        self.buckets_made.load(Ordering::SeqCst)
    }

    pub fn content_type(&self, bucket: &str, key: &str) -> Option<String> {
        let buckets = self.buckets.lock().unwrap();
        buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|obj| obj.content_type.clone())
    }

    fn check_fault(&self) -> Result<(), ObjectStoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Backend(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObjectStoreError> {
        self.check_fault()?;
        Ok(self.buckets.lock().unwrap().contains_key(bucket))
    }

    async fn make_bucket(&self, bucket: &str) -> Result<(), ObjectStoreError> {
        self.check_fault()?;
        self.buckets
            .lock()
            .unwrap()
            .insert(bucket.to_string(), BTreeMap::new());
        self.buckets_made.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: ObjectBody<'_>,
    ) -> Result<u64, ObjectStoreError> {
        self.check_fault()?;

        let mut body = body;
        let mut data = Vec::new();
        body.read_to_end(&mut data).await?;
        let size = data.len() as u64;

        let mut buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| ObjectStoreError::NotFound(bucket.to_string()))?;
        objects.insert(
            key.to_string(),
            StoredObject {
                data: Bytes::from(data),
                content_type: content_type.to_string(),
                info: ObjectInfo {
                    key: key.to_string(),
                    size,
                    last_modified: Utc::now(),
                },
            },
        );
        Ok(size)
    }

    async fn list(&self, bucket: &str) -> Result<Vec<ObjectInfo>, ObjectStoreError> {
        self.check_fault()?;
        let buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| ObjectStoreError::NotFound(bucket.to_string()))?;
        Ok(objects.values().map(|obj| obj.info.clone()).collect())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, ObjectStoreError> {
        self.check_fault()?;
        let buckets = self.buckets.lock().unwrap();
        buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|obj| obj.data.clone())
            .ok_or_else(|| ObjectStoreError::NotFound(format!("{bucket}/{key}")))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        self.check_fault()?;
        if let Some(objects) = self.buckets.lock().unwrap().get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }
}

pub fn body_from(data: &'static [u8]) -> ObjectBody<'static> {
    Box::pin(data)
}

/// Router state backed by a fresh [`MemoryStore`].
pub fn test_state() -> (Arc<MemoryStore>, Arc<AppState>) {
    let store = Arc::new(MemoryStore::new());

    let config = Config {
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            max_upload_size: 1024 * 1024, // 1MB for tests
        },
        profile: ConnectionProfile {
            backend: Backend::Minio,
            endpoint: "127.0.0.1:9000".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            region: "us-east-1".to_string(),
            secure: false,
        },
    };

    let state = Arc::new(AppState {
        config,
        storage: Arc::new(S3Api::new(Arc::clone(&store) as Arc<dyn ObjectStore>)),
    });

    (store, state)
}
