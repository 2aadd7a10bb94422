//! Router configuration.

use axum::{
    Extension, Router, middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;

use crate::api::handlers::{health_handler, redirect_handler, shorten_handler};
use crate::api::middleware::{EndpointPolicy, rate_limit, request_meta, tracing};
use crate::state::AppState;

/// Constructs the application router.
///
/// # Routes
///
/// - `POST /shorten` - create a short URL (write-scope limits apply)
/// - `GET /{code}` - redirect (read-scope limits apply)
/// - `GET /health` - liveness, exempt from rate limiting
///
/// # Middleware order
///
/// Each route declares its [`EndpointPolicy`] as an extension layered
/// outside the rate-limit middleware, so the limiter sees the override
/// before deciding. Request-meta extraction and tracing wrap the whole
/// router, so the limiter always receives the extracted client metadata.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/shorten",
            post(shorten_handler).layer(
                ServiceBuilder::new()
                    .layer(Extension(EndpointPolicy::Default))
                    .layer(middleware::from_fn_with_state(
                        state.clone(),
                        rate_limit::layer,
                    )),
            ),
        )
        .route(
            "/{code}",
            get(redirect_handler).layer(
                ServiceBuilder::new()
                    .layer(Extension(EndpointPolicy::Default))
                    .layer(middleware::from_fn_with_state(
                        state.clone(),
                        rate_limit::layer,
                    )),
            ),
        )
        .route(
            "/health",
            get(health_handler).layer(
                ServiceBuilder::new()
                    .layer(Extension(EndpointPolicy::Disabled))
                    .layer(middleware::from_fn_with_state(
                        state.clone(),
                        rate_limit::layer,
                    )),
            ),
        )
        .layer(middleware::from_fn(request_meta::layer))
        .layer(tracing::layer())
        .with_state(state)
}
