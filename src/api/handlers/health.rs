use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub storage_service: String,
    pub endpoint: String,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let profile = &state.config.profile;
    Json(HealthResponse {
        status: "healthy".to_string(),
        storage_service: profile.backend.to_string(),
        endpoint: profile.endpoint.clone(),
    })
}
