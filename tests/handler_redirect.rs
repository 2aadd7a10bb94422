mod common;

use std::sync::Arc;

use axum_test::TestServer;
use linkshort::routes::app_router;
use serde_json::json;

use common::{FailingPublisher, InMemoryRepository, create_test_state, create_test_state_with};

async fn shorten(server: &TestServer, url: &str) -> String {
    let response = server
        .post("/shorten")
        .json(&json!({ "url": url }))
        .await;

    response.assert_status_ok();
    response.json::<serde_json::Value>()["code"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_redirect_returns_moved_permanently() {
    let (state, _publisher) = create_test_state(common::generous_policy());
    let server = TestServer::new(app_router(state)).unwrap();

    let code = shorten(&server, "https://example.com/a").await;

    let response = server.get(&format!("/{code}")).await;

    response.assert_status(axum::http::StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.headers().get("location").unwrap().to_str().unwrap(),
        "https://example.com/a"
    );
}

#[tokio::test]
async fn test_redirect_unknown_code_is_not_found() {
    let (state, _publisher) = create_test_state(common::generous_policy());
    let server = TestServer::new(app_router(state)).unwrap();

    let response = server.get("/zzz_unknown").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_redirect_publishes_accessed_event() {
    let (state, publisher) = create_test_state(common::generous_policy());
    let server = TestServer::new(app_router(state)).unwrap();

    let code = shorten(&server, "https://example.com/tracked").await;

    let response = server
        .get(&format!("/{code}"))
        .add_header("user-agent", "integration-test/1.0")
        .add_header("referer", "https://news.example.com/post")
        .add_header("x-real-ip", "198.51.100.7")
        .await;

    response.assert_status(axum::http::StatusCode::MOVED_PERMANENTLY);

    let events = publisher.events_for("url.accessed");
    assert_eq!(events.len(), 1);

    let event = &events[0];
    assert_eq!(event["code"], serde_json::Value::String(code));
    assert_eq!(event["clientIp"], "198.51.100.7");
    assert_eq!(event["userAgent"], "integration-test/1.0");
    assert_eq!(event["referrer"], "https://news.example.com/post");
    assert!(event["accessedAt"].is_string());
}

#[tokio::test]
async fn test_redirect_succeeds_when_publisher_is_down() {
    let repository = Arc::new(InMemoryRepository::new());
    let state = create_test_state_with(
        repository,
        Arc::new(FailingPublisher),
        true,
        common::generous_policy(),
    );
    let server = TestServer::new(app_router(state)).unwrap();

    let code = shorten(&server, "https://example.com/resilient").await;

    let response = server.get(&format!("/{code}")).await;

    response.assert_status(axum::http::StatusCode::MOVED_PERMANENTLY);
}
