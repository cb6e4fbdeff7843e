//! bucket-gateway - A uniform bucket/file API over S3-compatible object storage
//!
//! This crate provides:
//! - Backend selection and connection settings resolved from the environment
//!   and layered `.env` override files (MinIO, AWS S3, Nebius)
//! - A storage gateway that turns every backend fault into a structured failure
//! - REST API with streamed multipart upload support

pub mod api;
pub mod config;
pub mod gateway;
pub mod object_store;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use config::Config;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn gateway::StorageApi>,
}
