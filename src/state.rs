//! Application state shared across HTTP handlers.
//!
//! Holds the layered repository, shortening strategies, analytics
//! publisher, rate limiter, and health checker. Cloned per request via
//! Axum's state extraction; cheap due to `Arc` wrapping.

use std::collections::HashMap;
use std::sync::Arc;

use crate::application::strategy::{HashStrategy, ShortenStrategy, StrategyKind, TokenStrategy};
use crate::domain::repositories::ShortUrlRepository;
use crate::infrastructure::health::HealthChecker;
use crate::infrastructure::messaging::AnalyticsPublisher;
use crate::ratelimit::PolicyLimiter;
use crate::utils::code_generator::CodeGenerator;

/// Shared application state injected into HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn ShortUrlRepository>,
    pub strategies: Arc<HashMap<StrategyKind, Arc<dyn ShortenStrategy>>>,
    pub analytics: Arc<AnalyticsPublisher>,
    pub limiter: Arc<PolicyLimiter>,
    pub health: Arc<dyn HealthChecker>,
    pub base_url: String,
}

impl AppState {
    /// Builds the state, constructing both strategies over the given
    /// repository.
    pub fn new(
        repository: Arc<dyn ShortUrlRepository>,
        analytics: Arc<AnalyticsPublisher>,
        limiter: Arc<PolicyLimiter>,
        health: Arc<dyn HealthChecker>,
        base_url: String,
        code_length: usize,
    ) -> Self {
        let generator = CodeGenerator::new(code_length);

        let mut strategies: HashMap<StrategyKind, Arc<dyn ShortenStrategy>> = HashMap::new();
        strategies.insert(
            StrategyKind::Token,
            Arc::new(TokenStrategy::new(repository.clone(), generator.clone())),
        );
        strategies.insert(
            StrategyKind::Hash,
            Arc::new(HashStrategy::new(repository.clone(), generator)),
        );

        Self {
            repository,
            strategies: Arc::new(strategies),
            analytics,
            limiter,
            health,
            base_url,
        }
    }
}
