//! Rate limit policy: scopes, limit configs, and the policy limiter.

use axum::http::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::store::RateLimitStore;
use crate::error::AppError;

/// Request category against which limits are configured.
///
/// The set is closed: every request carries `Global` plus either `Read`
/// or `Write` depending on its HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Read,
    Write,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Read => write!(f, "read"),
            Scope::Write => write!(f, "write"),
        }
    }
}

/// Resolves the scopes that apply to a request method.
///
/// GET, HEAD, and OPTIONS classify as read; everything else as write.
pub fn resolve_scopes(method: &Method) -> Vec<Scope> {
    let mut scopes = vec![Scope::Global];

    match method.as_str() {
        "GET" | "HEAD" | "OPTIONS" => scopes.push(Scope::Read),
        _ => scopes.push(Scope::Write),
    }

    scopes
}

/// One limit: at most `max` hits per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitConfig {
    pub max: i64,
    pub window: Duration,
}

impl LimitConfig {
    pub fn new(max: i64, window: Duration) -> Self {
        Self { max, window }
    }
}

/// Maps scopes to their ordered limit lists.
///
/// Evaluation order within a scope is registration order; this makes the
/// reported scope/window of a denial deterministic.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    limits: HashMap<Scope, Vec<LimitConfig>>,
}

impl Policy {
    pub fn limits_for(&self, scope: Scope) -> Option<&[LimitConfig]> {
        self.limits.get(&scope).map(Vec::as_slice)
    }
}

/// Builder for [`Policy`].
#[derive(Debug, Default)]
pub struct PolicyBuilder {
    limits: HashMap<Scope, Vec<LimitConfig>>,
}

impl PolicyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_limit(mut self, scope: Scope, max: i64, window: Duration) -> Self {
        self.limits
            .entry(scope)
            .or_default()
            .push(LimitConfig::new(max, window));
        self
    }

    pub fn build(self) -> Policy {
        Policy {
            limits: self.limits,
        }
    }
}

/// Details of the limit that denied a request.
#[derive(Debug, Clone, Copy)]
pub struct LimitExceeded {
    pub scope: Scope,
    pub config: LimitConfig,
    pub count: i64,
}

/// Evaluates requests against every limit of every applicable scope.
pub struct PolicyLimiter {
    store: Arc<dyn RateLimitStore>,
    policy: Policy,
}

impl PolicyLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, policy: Policy) -> Self {
        Self { store, policy }
    }

    /// Checks a request for the given client key and scopes.
    ///
    /// Returns `None` when every limit passes, or details of the first
    /// exceeded limit. Scopes are evaluated in the order given; limits
    /// within a scope in registration order. Evaluation stops at the first
    /// overage, so later counters are not incremented for a denied request.
    ///
    /// # Errors
    ///
    /// A counter store failure short-circuits with [`AppError::Internal`].
    pub async fn allow(
        &self,
        client_key: &str,
        scopes: &[Scope],
    ) -> Result<Option<LimitExceeded>, AppError> {
        for &scope in scopes {
            let Some(limits) = self.policy.limits_for(scope) else {
                continue;
            };

            for &limit in limits {
                let key = build_key(client_key, scope, limit.window);
                let count = self.store.record(&key, limit.window).await?;

                if count > limit.max {
                    return Ok(Some(LimitExceeded {
                        scope,
                        config: limit,
                        count,
                    }));
                }
            }
        }

        Ok(None)
    }

    /// The underlying counter store, for endpoints with custom limits.
    pub fn store(&self) -> Arc<dyn RateLimitStore> {
        self.store.clone()
    }
}

/// Composite counter key: one independent window per client, scope, and
/// window length.
fn build_key(client_key: &str, scope: Scope, window: Duration) -> String {
    format!("{}:{}:{}", client_key, scope, window.as_millis())
}
