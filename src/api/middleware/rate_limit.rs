//! Policy-driven rate limiting middleware.
//!
//! Runs after [`super::request_meta`] and before the handlers. Each route
//! may attach an [`EndpointPolicy`] to override the default policy
//! evaluation; the middleware pattern-matches the variant.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, error, warn};

use super::request_meta::{RequestMeta, client_fingerprint};
use crate::error::AppError;
use crate::ratelimit::{LimitConfig, resolve_scopes};
use crate::state::AppState;

/// Per-endpoint rate limit override, attached at route declaration via
/// `Extension`.
#[derive(Debug, Clone, Default)]
pub enum EndpointPolicy {
    /// Scope-based policy evaluation (the normal path).
    #[default]
    Default,
    /// No rate limiting and no counter mutation for this endpoint.
    Disabled,
    /// These limits replace policy evaluation entirely. Keys are scoped to
    /// the route template, so the whole endpoint class shares one bucket
    /// per client.
    CustomLimits(Vec<LimitConfig>),
}

/// Middleware evaluating the request against the configured limits.
pub async fn layer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let policy = req
        .extensions()
        .get::<EndpointPolicy>()
        .cloned()
        .unwrap_or_default();

    let meta = req
        .extensions()
        .get::<RequestMeta>()
        .cloned()
        .unwrap_or_default();

    match policy {
        EndpointPolicy::Disabled => {
            debug!(path = req.uri().path(), "rate limiting disabled for endpoint");

            next.run(req).await
        }
        EndpointPolicy::CustomLimits(limits) => {
            let client_key = client_fingerprint(&meta);

            // The route template, not the concrete path: every request
            // matching the route shares one bucket per client.
            let route = req
                .extensions()
                .get::<MatchedPath>()
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| req.uri().path().to_string());

            match check_custom_limits(&state, &client_key, &route, &limits, &meta).await {
                Ok(()) => next.run(req).await,
                Err(denial) => denial.into_response(),
            }
        }
        EndpointPolicy::Default => {
            let client_key = client_fingerprint(&meta);
            let scopes = resolve_scopes(req.method());

            match state.limiter.allow(&client_key, &scopes).await {
                Ok(None) => next.run(req).await,
                Ok(Some(exceeded)) => {
                    warn!(
                        path = req.uri().path(),
                        method = %req.method(),
                        scope = %exceeded.scope,
                        count = exceeded.count,
                        max = exceeded.config.max,
                        window_ms = exceeded.config.window.as_millis() as u64,
                        client_ip = %meta.client_ip,
                        "rate limit exceeded"
                    );

                    AppError::rate_limited(
                        format!(
                            "rate limit exceeded: {} scope, {}/{} requests in {:?}",
                            exceeded.scope, exceeded.count, exceeded.config.max,
                            exceeded.config.window
                        ),
                        json!({
                            "scope": exceeded.scope.to_string(),
                            "count": exceeded.count,
                            "max": exceeded.config.max,
                            "window_ms": exceeded.config.window.as_millis() as u64,
                        }),
                    )
                    .into_response()
                }
                Err(e) => {
                    error!(path = req.uri().path(), error = %e, "rate limit check failed");

                    AppError::internal("internal server error", json!({})).into_response()
                }
            }
        }
    }
}

async fn check_custom_limits(
    state: &AppState,
    client_key: &str,
    route: &str,
    limits: &[LimitConfig],
    meta: &RequestMeta,
) -> Result<(), AppError> {
    let store = state.limiter.store();

    for limit in limits {
        let key = format!(
            "{}:custom:{}:{}",
            client_key,
            route,
            limit.window.as_millis()
        );

        let count = store.record(&key, limit.window).await.map_err(|e| {
            error!(route, error = %e, "custom rate limit check failed");

            AppError::internal("internal server error", json!({}))
        })?;

        if count > limit.max {
            warn!(
                route,
                count,
                max = limit.max,
                window_ms = limit.window.as_millis() as u64,
                client_ip = %meta.client_ip,
                "custom rate limit exceeded"
            );

            return Err(AppError::rate_limited(
                format!(
                    "rate limit exceeded: {}/{} requests in {:?}",
                    count, limit.max, limit.window
                ),
                json!({
                    "count": count,
                    "max": limit.max,
                    "window_ms": limit.window.as_millis() as u64,
                }),
            ));
        }
    }

    Ok(())
}
