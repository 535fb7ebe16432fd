//! # Health Check Endpoints
//!
//! Liveness (`/health`) and readiness (`/ready`) probes for load balancers
//! and container orchestration.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::error;

use crate::state::AppState;

/// Basic health check endpoint for liveness monitoring.
///
/// Always returns 200 unless the process itself is wedged; does not touch
/// any dependency.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = Object)
    ),
    tag = "health"
)]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "warden-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check: verifies the database pool can serve a trivial query.
///
/// # HTTP Status Codes
///
/// - **200 OK**: database is reachable
/// - **503 Service Unavailable**: database is not reachable
#[utoipa::path(
    get,
    path = "/ready",
    responses(
        (status = 200, description = "Service is ready", body = Object),
        (status = 503, description = "Service is not ready", body = Object)
    ),
    tag = "health"
)]
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = match state.db.check_health().await {
        Ok(_) => true,
        Err(e) => {
            error!("Database health check failed: {}", e);
            false
        }
    };

    let status = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "ready": db_healthy,
            "checks": {
                "database": db_healthy,
            }
        })),
    )
}
