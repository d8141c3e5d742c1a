/// Health check endpoint
///
/// Verifies the server is running and the document store answers.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "storage": "postgres",
///   "store_status": "connected"
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use restaurant_shared::store::RequestScope;
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status: `healthy` or `degraded`
    pub status: String,

    /// Application version
    pub version: String,

    /// Storage backend name
    pub storage: String,

    /// `connected` or `disconnected`
    pub store_status: String,
}

/// Health check handler
pub async fn health_check(
    State(state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<Json<HealthResponse>> {
    let connected = match scope.run(state.store.ping()).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Store health check failed");
            false
        }
    };

    Ok(Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: state.store.backend().to_string(),
        store_status: if connected { "connected" } else { "disconnected" }.to_string(),
    }))
}
