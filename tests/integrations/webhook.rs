//! End-to-end tests of the HTTP boundary over a real loopback socket.

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::app::{
    TestAppBuilder, MONITORING_TOKEN, MONITORING_URL, SUBSCRIPTIONS_TOKEN, SUBSCRIPTIONS_URL,
};
use helpers::payloads;
use hookrelay::core::OutputMessage;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_incident_is_delivered_to_monitoring_webhook() {
    let app = TestAppBuilder::new().start().await.unwrap();

    let res = app.post_monitoring(&payloads::open_incident()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let sent = app.client.sent();
    assert_eq!(sent.len(), 1);
    let (url, message) = &sent[0];
    assert_eq!(url, MONITORING_URL);
    assert_eq!(message.username, "GCP Monitoring");
    assert_eq!(
        message.embeds[0].title,
        "\"prod-project\" - Incident opened for \"Uptime check\""
    );

    app.shutdown(SHUTDOWN_TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn test_subscription_is_delivered_to_subscriptions_webhook() {
    let app = TestAppBuilder::new().start().await.unwrap();

    let res = app.post_subscription(&payloads::subscription_started()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let sent = app.client.sent();
    assert_eq!(sent.len(), 1);
    let (url, message) = &sent[0];
    assert_eq!(url, SUBSCRIPTIONS_URL);
    assert_eq!(message.username, "Adapty");
    assert_eq!(message.embeds[0].title, "Adapty: Subscription Started");

    app.shutdown(SHUTDOWN_TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn test_success_echoes_the_delivered_message() {
    let app = TestAppBuilder::new().start().await.unwrap();

    let res = app.post_subscription(&payloads::loose_subscription_renewed()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let echoed: OutputMessage = res.json().await.unwrap();

    let sent = app.client.sent();
    assert_eq!(sent[0].1, echoed);
    assert_eq!(
        echoed.embeds[0].description,
        "A subscription has been renewed for 4.99 USD."
    );

    app.shutdown(SHUTDOWN_TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn test_either_token_authenticates_any_payload() {
    let app = TestAppBuilder::new().start().await.unwrap();

    // Routing follows the payload, not the credential used.
    let res = app.post_subscription(&payloads::open_incident()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(app.client.sent()[0].0, MONITORING_URL);

    app.shutdown(SHUTDOWN_TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn test_bad_credentials_are_rejected() {
    let app = TestAppBuilder::new().start().await.unwrap();

    let cases = [
        app.http
            .post(app.url("/"))
            .json(&payloads::open_incident()),
        app.http
            .post(app.url("/"))
            .header("Authorization", "wrong")
            .json(&payloads::open_incident()),
        app.http
            .post(app.url(&format!("/?auth_token={}", SUBSCRIPTIONS_TOKEN)))
            .json(&payloads::open_incident()),
        app.http
            .post(app.url("/"))
            .header("Authorization", MONITORING_TOKEN)
            .json(&payloads::open_incident()),
    ];

    for request in cases {
        let res = request.send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.text().await.unwrap(), "unauthorized");
    }
    assert_eq!(app.client.sent_count(), 0);

    app.shutdown(SHUTDOWN_TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn test_unset_tokens_deny_everything() {
    let app = TestAppBuilder::new()
        .with_config_modifier(|config| {
            config.monitoring.auth_token = None;
            config.subscriptions.auth_token = None;
        })
        .start()
        .await
        .unwrap();

    let res = app
        .http
        .post(app.url("/?auth_token="))
        .header("Authorization", "")
        .json(&payloads::open_incident())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    app.shutdown(SHUTDOWN_TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn test_wrong_method_or_content_type_is_invalid_request() {
    let app = TestAppBuilder::new().start().await.unwrap();

    let get = app
        .http
        .get(app.url("/"))
        .header("Authorization", SUBSCRIPTIONS_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(get.status(), StatusCode::BAD_REQUEST);
    assert_eq!(get.text().await.unwrap(), "invalid request");

    let text = app
        .http
        .post(app.url("/"))
        .header("Authorization", SUBSCRIPTIONS_TOKEN)
        .header("Content-Type", "text/plain")
        .body(payloads::subscription_started().to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(text.status(), StatusCode::BAD_REQUEST);
    assert_eq!(text.text().await.unwrap(), "invalid request");

    assert_eq!(app.client.sent_count(), 0);
    app.shutdown(SHUTDOWN_TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn test_json_content_type_with_charset_is_accepted() {
    let app = TestAppBuilder::new().start().await.unwrap();

    let res = app
        .http
        .post(app.url("/"))
        .header("Authorization", SUBSCRIPTIONS_TOKEN)
        .header("Content-Type", "application/json; charset=utf-8")
        .body(payloads::subscription_started().to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    app.shutdown(SHUTDOWN_TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn test_malformed_and_unrecognized_payloads() {
    let app = TestAppBuilder::new().start().await.unwrap();

    let malformed = app
        .http
        .post(app.url("/"))
        .header("Authorization", SUBSCRIPTIONS_TOKEN)
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    assert_eq!(malformed.text().await.unwrap(), "invalid payload format");

    let unrecognized = app.post_subscription(&json!({ "foo": "bar" })).await;
    assert_eq!(unrecognized.status(), StatusCode::BAD_REQUEST);
    assert_eq!(unrecognized.text().await.unwrap(), "invalid payload format");

    assert_eq!(app.client.sent_count(), 0);
    app.shutdown(SHUTDOWN_TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn test_verification_requests_are_answered_and_not_delivered() {
    let app = TestAppBuilder::new().start().await.unwrap();

    let check = app.post_subscription(&json!({ "adapty_check": "xyz123" })).await;
    assert_eq!(check.status(), StatusCode::OK);
    let body: Value = check.json().await.unwrap();
    assert_eq!(body, json!({ "adapty_check_response": "xyz123" }));

    for mount in [json!({ "event": "isMount" }), json!({ "data": { "event": "isMount" } })] {
        let res = app.post_subscription(&mount).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["status"], "ok");
    }

    assert_eq!(app.client.sent_count(), 0);
    app.shutdown(SHUTDOWN_TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn test_verification_still_requires_authentication() {
    let app = TestAppBuilder::new().start().await.unwrap();

    let res = app
        .http
        .post(app.url("/"))
        .json(&json!({ "adapty_check": "xyz123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    app.shutdown(SHUTDOWN_TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn test_delivery_failure_returns_server_error() {
    let app = TestAppBuilder::new()
        .with_failing_delivery()
        .start()
        .await
        .unwrap();

    let res = app.post_monitoring(&payloads::closed_incident()).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.client.sent_count(), 0);

    app.shutdown(SHUTDOWN_TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn test_healthz() {
    let app = TestAppBuilder::new().start().await.unwrap();

    let res = app.http.get(app.url("/healthz")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "ok");

    // Metrics are disabled by default.
    let metrics = app.http.get(app.url("/metrics")).send().await.unwrap();
    assert_eq!(metrics.status(), StatusCode::NOT_FOUND);

    app.shutdown(SHUTDOWN_TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn test_build_rejects_invalid_config() {
    let result = TestAppBuilder::new()
        .with_config_modifier(|config| config.subscriptions.webhook_url = String::new())
        .start()
        .await;
    assert!(result.is_err());
}
