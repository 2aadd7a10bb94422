//! DTOs for the shorten endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to shorten a URL.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// The URL to shorten, stored verbatim.
    #[validate(length(min = 1, message = "URL must not be empty"))]
    pub url: String,

    /// Shortening strategy: `token` (default) or `hash`.
    pub strategy: Option<String>,
}

/// Response for a successfully created short URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub code: String,
    pub short_url: String,
    pub original_url: String,
}
