use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use s3::bucket::Bucket;
use s3::bucket_ops::BucketConfiguration;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;

use super::{ObjectBody, ObjectInfo, ObjectStore, ObjectStoreError};
use crate::config::{ConfigError, ConnectionProfile};

/// Object store backed by any S3-compatible service (MinIO, AWS S3, Nebius).
pub struct S3Store {
    /// Built once; per-bucket handles are clones sharing its HTTP client and
    /// connection pool.
    template: Box<Bucket>,
}

impl S3Store {
    pub fn new(profile: ConnectionProfile) -> Result<Self, ConfigError> {
        let credentials = Credentials::new(
            Some(&profile.access_key),
            Some(&profile.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| ConfigError::Credentials(e.to_string()))?;

        let scheme = if profile.secure { "https" } else { "http" };
        let region = Region::Custom {
            region: profile.region.clone(),
            endpoint: format!("{scheme}://{}", profile.endpoint),
        };

        let template = Bucket::new("", region, credentials)
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        let template = if profile.backend.uses_path_style() {
            template.with_path_style()
        } else {
            template
        };

        Ok(Self { template })
    }

    /// Handle for a single bucket on the shared client.
    fn bucket(&self, name: &str) -> Bucket {
        let mut bucket = (*self.template).clone();
        bucket.name = name.to_string();
        bucket
    }

    async fn credentials(&self) -> Result<Credentials, ObjectStoreError> {
        self.template
            .credentials()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    /// `HEAD` on the bucket root (HeadBucket), so only access to this bucket is needed.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObjectStoreError> {
        let target = format!("bucket {bucket}");
        let (_, code) = self
            .bucket(bucket)
            .head_object("")
            .await
            .map_err(|e| classify(e, &target))?;
        bucket_presence(code, &target)
    }

    // rust-s3 only exposes bucket creation as a constructor, which builds its
    // own client for this one request.
    async fn make_bucket(&self, bucket: &str) -> Result<(), ObjectStoreError> {
        let target = format!("bucket {bucket}");
        let config = BucketConfiguration::default();
        let region = self.template.region();
        let credentials = self.credentials().await?;

        let response = if self.template.is_path_style() {
            Bucket::create_with_path_style(bucket, region, credentials, config).await
        } else {
            Bucket::create(bucket, region, credentials, config).await
        }
        .map_err(|e| classify(e, &target))?;

        check_status(
            response.response_code,
            &target,
            response.response_text.as_bytes(),
        )
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: ObjectBody<'_>,
    ) -> Result<u64, ObjectStoreError> {
        let target = format!("{bucket}/{key}");
        let mut body = body;
        let response = self
            .bucket(bucket)
            .put_object_stream_with_content_type(&mut body, key, content_type)
            .await
            .map_err(|e| classify(e, &target))?;

        check_status(response.status_code(), &target, &[])?;
        Ok(response.uploaded_bytes() as u64)
    }

    async fn list(&self, bucket: &str) -> Result<Vec<ObjectInfo>, ObjectStoreError> {
        let pages = self
            .bucket(bucket)
            .list(String::new(), None)
            .await
            .map_err(|e| classify(e, &format!("bucket {bucket}")))?;

        let mut objects = Vec::new();
        for page in pages {
            for obj in page.contents {
                let last_modified = DateTime::parse_from_rfc3339(&obj.last_modified)
                    .map_err(|e| {
                        ObjectStoreError::Backend(format!(
                            "unparsable last-modified {:?} for {}: {e}",
                            obj.last_modified, obj.key
                        ))
                    })?
                    .with_timezone(&Utc);

                objects.push(ObjectInfo {
                    key: obj.key,
                    size: obj.size,
                    last_modified,
                });
            }
        }

        Ok(objects)
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, ObjectStoreError> {
        let target = format!("{bucket}/{key}");
        let response = self
            .bucket(bucket)
            .get_object(key)
            .await
            .map_err(|e| classify(e, &target))?;
        check_status(response.status_code(), &target, response.bytes())?;
        Ok(response.bytes().clone())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        let target = format!("{bucket}/{key}");
        let response = self
            .bucket(bucket)
            .delete_object(key)
            .await
            .map_err(|e| classify(e, &target))?;
        check_status(response.status_code(), &target, response.bytes())
    }
}

/// Client-library errors; a non-2xx answer folded into an error keeps its status.
fn classify(e: S3Error, target: &str) -> ObjectStoreError {
    match e {
        S3Error::HttpFailWithBody(code, body) => status_error(code, target, body.as_bytes()),
        other => ObjectStoreError::Backend(format!("{target}: {other}")),
    }
}

fn bucket_presence(code: u16, target: &str) -> Result<bool, ObjectStoreError> {
    match code {
        404 => Ok(false),
        _ => check_status(code, target, &[]).map(|()| true),
    }
}

/// The client is built without `fail-on-err`, so non-2xx answers arrive as
/// ordinary responses and are classified here.
fn check_status(code: u16, target: &str, body: &[u8]) -> Result<(), ObjectStoreError> {
    if (200..300).contains(&code) {
        Ok(())
    } else {
        Err(status_error(code, target, body))
    }
}

fn status_error(code: u16, target: &str, body: &[u8]) -> ObjectStoreError {
    let body = String::from_utf8_lossy(body);
    match code {
        404 => ObjectStoreError::NotFound(target.to_string()),
        400 => ObjectStoreError::InvalidInput(format!("{target} rejected ({code}): {body}")),
        _ => ObjectStoreError::Backend(format!("{target} failed ({code}): {body}")),
    }
}
