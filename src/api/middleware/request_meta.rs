//! Request metadata extraction.
//!
//! Populates a per-request [`RequestMeta`] value from forwarding headers,
//! consumed by the rate limiter (client fingerprint) and the analytics
//! events.

use axum::{
    extract::{ConnectInfo, Request},
    http::header,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use std::net::SocketAddr;

/// Client metadata captured once at the boundary.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub client_ip: String,
    pub user_agent: String,
    pub referrer: String,
}

/// Middleware inserting [`RequestMeta`] into request extensions.
pub async fn layer(mut req: Request, next: Next) -> Response {
    let meta = RequestMeta {
        client_ip: extract_client_ip(&req),
        user_agent: header_value(&req, header::USER_AGENT),
        referrer: header_value(&req, header::REFERER),
    };

    req.extensions_mut().insert(meta);

    next.run(req).await
}

/// Derives the rate-limit bucket key for a client.
///
/// Stable for identical (IP, User-Agent) pairs, including when either
/// part is empty.
pub fn client_fingerprint(meta: &RequestMeta) -> String {
    let digest = Sha256::digest(format!("{}|{}", meta.client_ip, meta.user_agent).as_bytes());

    format!("{:x}", digest)
}

/// Client IP resolution order: first X-Forwarded-For entry, then
/// X-Real-IP, then the peer socket address.
fn extract_client_ip(req: &Request) -> String {
    if let Some(xff) = req.headers().get("x-forwarded-for")
        && let Ok(value) = xff.to_str()
        && let Some(first) = value.split(',').next()
        && !first.trim().is_empty()
    {
        return first.trim().to_string();
    }

    if let Some(xri) = req.headers().get("x-real-ip")
        && let Ok(value) = xri.to_str()
    {
        return value.trim().to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_default()
}

fn header_value(req: &Request, name: header::HeaderName) -> String {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
