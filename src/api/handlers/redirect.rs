//! Handler for short URL redirect.

use axum::{
    Extension,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use tracing::error;

use crate::api::middleware::RequestMeta;
use crate::domain::events::UrlAccessedEvent;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// The lookup traverses the repository tiers (LRU, Redis, Postgres); a
/// cache-tier outage degrades to the durable store transparently. On
/// success a [`UrlAccessedEvent`] is published best-effort and the
/// response is `301 Moved Permanently` with the original URL in
/// `Location`.
///
/// # Errors
///
/// - `404` for an unknown code
/// - `500` for storage failures, with an opaque body
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    Extension(meta): Extension<RequestMeta>,
) -> Result<impl IntoResponse, AppError> {
    let short_url = state
        .repository
        .find_by_code(&code)
        .await
        .map_err(|e| {
            error!(code, error = %e, "failed to get url");

            AppError::internal("failed to get url", json!({}))
        })?
        .ok_or_else(|| AppError::not_found("short url not found", json!({ "code": code })))?;

    let event = UrlAccessedEvent {
        code: short_url.code.clone(),
        accessed_at: Utc::now(),
        client_ip: meta.client_ip,
        user_agent: meta.user_agent,
        referrer: meta.referrer,
    };

    if let Err(e) = state.analytics.publish_url_accessed(&event).await {
        error!(code = %event.code, error = %e, "failed to publish access event");
    }

    Ok((
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, short_url.original_url)],
    ))
}
