//! Handler for the shorten endpoint.

use axum::{
    Extension, Json,
    extract::State,
    http::header,
    response::IntoResponse,
};
use serde_json::json;
use tracing::error;
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::api::middleware::RequestMeta;
use crate::application::strategy::StrategyKind;
use crate::domain::events::UrlCreatedEvent;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short URL.
///
/// # Endpoint
///
/// `POST /shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/very/long/path", "strategy": "hash" }
/// ```
///
/// `strategy` is optional and defaults to `token`. The `hash` strategy
/// returns the existing record when an equivalent URL was shortened
/// before.
///
/// # Response
///
/// `200 OK` with `{code, shortUrl, originalUrl}` and a `Location` header
/// pointing at the short URL. A [`UrlCreatedEvent`] is published
/// best-effort; publish failures never fail the request.
///
/// # Errors
///
/// - `400` for an unknown strategy or (hash strategy) an unparseable URL
/// - `500` for storage failures, with an opaque body
pub async fn shorten_handler(
    State(state): State<AppState>,
    Extension(meta): Extension<RequestMeta>,
    Json(payload): Json<ShortenRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let kind = match payload.strategy.as_deref() {
        None | Some("") => StrategyKind::Token,
        Some(name) => StrategyKind::parse(name).ok_or_else(|| {
            AppError::bad_request(
                "invalid strategy: must be 'token' or 'hash'",
                json!({ "strategy": name }),
            )
        })?,
    };

    let strategy = state
        .strategies
        .get(&kind)
        .ok_or_else(|| AppError::internal("strategy not configured", json!({})))?;

    let short_url = strategy.shorten(&payload.url).await.map_err(|e| match e {
        AppError::Validation { .. } => e,
        other => {
            error!(error = %other, "failed to shorten url");

            AppError::internal("failed to save url", json!({}))
        }
    })?;

    let event = UrlCreatedEvent {
        code: short_url.code.clone(),
        original_url: short_url.original_url.clone(),
        url_hash: short_url.url_hash.clone(),
        strategy: kind.as_str().to_string(),
        created_at: short_url.created_at,
        client_ip: meta.client_ip,
        user_agent: meta.user_agent,
    };

    if let Err(e) = state.analytics.publish_url_created(&event).await {
        error!(code = %event.code, error = %e, "failed to publish created event");
    }

    let full_short_url = format!("{}/{}", state.base_url, short_url.code);

    let body = ShortenResponse {
        code: short_url.code,
        short_url: full_short_url.clone(),
        original_url: short_url.original_url,
    };

    Ok(([(header::LOCATION, full_short_url)], Json(body)))
}
