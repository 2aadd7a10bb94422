//! DTO for the health endpoint.

use serde::Serialize;

/// Service health with dependency detail.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub redis: String,
}
