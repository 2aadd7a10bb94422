mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use linkshort::routes::app_router;
use serde_json::json;

use common::create_test_state;

#[tokio::test]
async fn test_token_create_then_redirect_emits_both_events() {
    let (state, publisher) = create_test_state(common::generous_policy());
    let server = TestServer::new(app_router(state)).unwrap();

    let created = server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com/a", "strategy": "token" }))
        .await;
    created.assert_status_ok();

    let code = created.json::<serde_json::Value>()["code"]
        .as_str()
        .unwrap()
        .to_string();

    let redirect = server.get(&format!("/{code}")).await;
    redirect.assert_status(StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        redirect.headers().get("location").unwrap().to_str().unwrap(),
        "https://example.com/a"
    );

    let created_events = publisher.events_for("url.created");
    assert_eq!(created_events.len(), 1);
    assert_eq!(created_events[0]["code"].as_str().unwrap(), code);
    assert_eq!(created_events[0]["strategy"], "token");

    let accessed_events = publisher.events_for("url.accessed");
    assert_eq!(accessed_events.len(), 1);
    assert_eq!(accessed_events[0]["code"].as_str().unwrap(), code);
}

#[tokio::test]
async fn test_hash_dedup_redirects_to_first_submission() {
    let (state, _publisher) = create_test_state(common::generous_policy());
    let server = TestServer::new(app_router(state)).unwrap();

    let first = server
        .post("/shorten")
        .json(&json!({ "url": "HTTPS://EXAMPLE.COM/p/", "strategy": "hash" }))
        .await;
    let second = server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com:443/p", "strategy": "hash" }))
        .await;

    let code1 = first.json::<serde_json::Value>()["code"].clone();
    let code2 = second.json::<serde_json::Value>()["code"].clone();
    assert_eq!(code1, code2);

    // The surviving record redirects to the first writer's verbatim URL.
    let redirect = server.get(&format!("/{}", code1.as_str().unwrap())).await;
    redirect.assert_status(StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        redirect.headers().get("location").unwrap().to_str().unwrap(),
        "HTTPS://EXAMPLE.COM/p/"
    );
}
