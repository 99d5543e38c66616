//! Health check endpoint.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status; "ok" when every collaborator answered.
    pub status: &'static str,
    /// Active storage backend name.
    pub storage_backend: &'static str,
}

/// GET /health
///
/// Intentionally unauthenticated for load balancers and probes.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state
        .storage
        .health_check()
        .await
        .map_err(|e| ApiError::Internal(format!("storage health check failed: {e}")))?;
    state
        .keys
        .health_check()
        .await
        .map_err(|e| ApiError::Internal(format!("keystore health check failed: {e}")))?;

    Ok(Json(HealthResponse {
        status: "ok",
        storage_backend: state.storage.backend_name(),
    }))
}
