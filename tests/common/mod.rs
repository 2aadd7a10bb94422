#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use linkshort::domain::entities::ShortUrl;
use linkshort::domain::repositories::ShortUrlRepository;
use linkshort::error::AppError;
use linkshort::infrastructure::health::HealthChecker;
use linkshort::infrastructure::messaging::{AnalyticsPublisher, EventPublisher};
use linkshort::ratelimit::{MemoryRateLimitStore, Policy, PolicyBuilder, PolicyLimiter, Scope};
use linkshort::state::AppState;

/// In-memory repository with durable-tier semantics: first writer wins on
/// code, hash index kept functional.
#[derive(Default)]
pub struct InMemoryRepository {
    urls: Mutex<HashMap<String, ShortUrl>>,
    hashes: Mutex<HashMap<String, String>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.urls.lock().unwrap().len()
    }
}

#[async_trait]
impl ShortUrlRepository for InMemoryRepository {
    async fn save(&self, short_url: &ShortUrl) -> Result<(), AppError> {
        let mut urls = self.urls.lock().unwrap();

        if urls.contains_key(&short_url.code) {
            return Ok(());
        }

        urls.insert(short_url.code.clone(), short_url.clone());

        if let Some(hash) = &short_url.url_hash {
            self.hashes
                .lock()
                .unwrap()
                .entry(hash.clone())
                .or_insert_with(|| short_url.code.clone());
        }

        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortUrl>, AppError> {
        Ok(self.urls.lock().unwrap().get(code).cloned())
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<ShortUrl>, AppError> {
        let code = match self.hashes.lock().unwrap().get(hash) {
            Some(code) => code.clone(),
            None => return Ok(None),
        };

        self.find_by_code(&code).await
    }
}

/// Publisher that records every append for assertions.
#[derive(Default)]
pub struct CapturingPublisher {
    published: Mutex<Vec<(String, Vec<u8>)>>,
}

impl CapturingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded payloads published to a topic, in publish order.
    pub fn events_for(&self, topic: &str) -> Vec<serde_json::Value> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| serde_json::from_slice(payload).unwrap())
            .collect()
    }
}

#[async_trait]
impl EventPublisher for CapturingPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), AppError> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));

        Ok(())
    }
}

/// Publisher whose appends always fail; the API must shrug it off.
pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _topic: &str, _payload: Vec<u8>) -> Result<(), AppError> {
        Err(AppError::internal("broker down", serde_json::json!({})))
    }
}

/// Health checker with a fixed answer.
pub struct StaticHealthChecker(pub bool);

#[async_trait]
impl HealthChecker for StaticHealthChecker {
    async fn ping(&self) -> bool {
        self.0
    }
}

pub const BASE_URL: &str = "http://localhost:8888";

/// Permissive policy so rate limiting stays out of the way unless a test
/// configures tighter limits.
pub fn generous_policy() -> Policy {
    PolicyBuilder::new()
        .add_limit(Scope::Global, 1_000_000, Duration::from_secs(24 * 3600))
        .add_limit(Scope::Read, 100_000, Duration::from_secs(60))
        .add_limit(Scope::Write, 100_000, Duration::from_secs(60))
        .build()
}

pub fn create_test_state(policy: Policy) -> (AppState, Arc<CapturingPublisher>) {
    let publisher = Arc::new(CapturingPublisher::new());

    (
        create_test_state_with(
            Arc::new(InMemoryRepository::new()),
            publisher.clone(),
            true,
            policy,
        ),
        publisher,
    )
}

pub fn create_test_state_with(
    repository: Arc<dyn ShortUrlRepository>,
    publisher: Arc<dyn EventPublisher>,
    redis_healthy: bool,
    policy: Policy,
) -> AppState {
    let analytics = Arc::new(AnalyticsPublisher::new(
        publisher,
        "url.created".to_string(),
        "url.accessed".to_string(),
    ));

    let limiter = Arc::new(PolicyLimiter::new(
        Arc::new(MemoryRateLimitStore::new()),
        policy,
    ));

    AppState::new(
        repository,
        analytics,
        limiter,
        Arc::new(StaticHealthChecker(redis_healthy)),
        BASE_URL.to_string(),
        8,
    )
}
