//! Handler for the health endpoint.

use axum::{Json, extract::State};

use crate::api::dto::health::HealthResponse;
use crate::state::AppState;

/// Reports service health and Redis reachability.
///
/// # Endpoint
///
/// `GET /health`
///
/// Always `200 OK`. With Redis unreachable the service still serves
/// reads and writes from the durable store, so the status degrades
/// rather than fails.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let redis_healthy = state.health.ping().await;

    let response = if redis_healthy {
        HealthResponse {
            status: "ok".to_string(),
            redis: "healthy".to_string(),
        }
    } else {
        HealthResponse {
            status: "degraded".to_string(),
            redis: "unhealthy".to_string(),
        }
    };

    Json(response)
}
