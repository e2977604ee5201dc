use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use duet_relay::brokers::memory::InMemoryBroker;
use duet_relay::core::broker::MessageBroker;
use duet_relay::core::dispatcher::Dispatcher;
use duet_relay::core::registry::RoomRegistry;
use duet_relay::web::app::{AppState, router};
use http_body_util::BodyExt;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use crate::common;

struct TestApp {
    app: Router,
    registry: Arc<RoomRegistry>,
    cancel: CancellationToken,
    dispatcher_task: tokio::task::JoinHandle<anyhow::Result<()>>,
}

/// The full HTTP surface over live components, dispatcher included.
fn spawn_app() -> TestApp {
    let directory = Arc::new(common::test_directory());
    let registry = Arc::new(RoomRegistry::new());
    let broker = Arc::new(InMemoryBroker::new(64));
    let rx = broker.subscribe().expect("subscribe");
    let cancel = CancellationToken::new();
    let dispatcher = Dispatcher::new(registry.clone(), rx);
    let dispatcher_task = tokio::spawn(dispatcher.run(cancel.clone()));

    let state =
        AppState::new(directory, registry.clone(), broker as Arc<dyn MessageBroker>, 8);
    TestApp { app: router(state), registry, cancel, dispatcher_task }
}

impl TestApp {
    async fn shutdown(self) {
        self.cancel.cancel();
        assert_ok!(self.dispatcher_task.await.unwrap());
    }
}

fn post_message(token: &str, content: &str) -> Request<Body> {
    let uri = if token.is_empty() {
        "/messages".to_string()
    } else {
        format!("/messages?token={token}")
    };
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(format!(r#"{{"content":"{content}"}}"#)))
        .expect("request")
}

#[tokio::test]
async fn test_post_messages_accepts_and_relays() {
    let harness = spawn_app();
    let (_bob, mut bob_rx) = common::join_member(&harness.registry, 1, 2, 8);

    let response = harness
        .app
        .clone()
        .oneshot(post_message(common::ALICE_TOKEN, "hi"))
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = response.into_body().collect().await.expect("body").to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(json["status"], "accepted");

    let delivered = tokio::time::timeout(Duration::from_secs(1), bob_rx.recv())
        .await
        .expect("delivery timed out")
        .expect("outbound channel closed");
    assert_eq!(delivered.content, "hi");

    harness.shutdown().await;
}

#[tokio::test]
async fn test_post_messages_never_crosses_rooms() {
    let harness = spawn_app();
    let (_bob, mut bob_rx) = common::join_member(&harness.registry, 1, 2, 8);
    let (_outsider, mut outsider_rx) = common::join_member(&harness.registry, 2, 4, 8);

    let response = harness
        .app
        .clone()
        .oneshot(post_message(common::ALICE_TOKEN, "hi"))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let delivered = tokio::time::timeout(Duration::from_secs(1), bob_rx.recv())
        .await
        .expect("delivery timed out")
        .expect("outbound channel closed");
    assert_eq!(delivered.content, "hi");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(outsider_rx.try_recv().is_err());

    harness.shutdown().await;
}

#[tokio::test]
async fn test_post_messages_without_token_is_unauthorized() {
    let harness = spawn_app();

    let response =
        harness.app.clone().oneshot(post_message("", "hi")).await.expect("request failed");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    harness.shutdown().await;
}

#[tokio::test]
async fn test_post_messages_with_unknown_token_is_unauthorized() {
    let harness = spawn_app();

    let response = harness
        .app
        .clone()
        .oneshot(post_message("forged_token", "hi"))
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    harness.shutdown().await;
}

#[tokio::test]
async fn test_post_messages_with_broker_down_is_service_unavailable() {
    // No dispatcher at all: the subscription is taken and dropped, so the
    // transport is gone and publish must fail fast instead of hanging
    let directory = Arc::new(common::test_directory());
    let registry = Arc::new(RoomRegistry::new());
    let broker = Arc::new(InMemoryBroker::new(64));
    drop(broker.subscribe().expect("subscribe"));
    let state = AppState::new(directory, registry, broker as Arc<dyn MessageBroker>, 8);
    let app = router(state);

    let response = tokio::time::timeout(
        Duration::from_secs(1),
        app.oneshot(post_message(common::ALICE_TOKEN, "hi")),
    )
    .await
    .expect("request hung")
    .expect("request failed");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
