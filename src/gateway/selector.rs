use std::sync::Arc;

use super::{S3Api, StorageApi};
use crate::config::{Backend, ConfigError, ConnectionProfile};
use crate::object_store::S3Store;

/// Build the gateway for `identifier`, bound to `profile`.
///
/// Called once at startup. An absent, empty or unknown identifier is a
/// configuration error naming it.
pub fn select(
    identifier: Option<&str>,
    profile: ConnectionProfile,
) -> Result<Arc<dyn StorageApi>, ConfigError> {
    let backend: Backend = identifier.unwrap_or_default().parse()?;

    if backend != profile.backend {
        return Err(ConfigError::Mismatch {
            requested: backend.to_string(),
            resolved: profile.backend.to_string(),
        });
    }

    match backend {
        // All supported services speak S3; the profile carries the differences.
        Backend::Aws | Backend::Minio | Backend::Nebius => {
            let store = S3Store::new(profile)?;
            Ok(Arc::new(S3Api::new(Arc::new(store))))
        }
    }
}
