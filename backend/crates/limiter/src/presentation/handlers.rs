//! HTTP Handlers

use crate::presentation::dto::HealthResponse;
use axum::Json;

/// GET /
///
/// Demo endpoint sitting behind the limiter.
pub async fn index() -> &'static str {
    "testapi\n"
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
