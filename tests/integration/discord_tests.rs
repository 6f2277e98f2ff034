//! Discord Notifier Integration Tests
//!
//! Tests message delivery against a local REST stub:
//! - Endpoint path, bot authorization header and payload
//! - Rate limit and rejection mapping
//! - Unreachable API

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use buywatch_operator::notifications::{DeliveryError, DiscordNotifier, Notifier};
use parking_lot::Mutex;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::support::spawn_server;

#[derive(Debug, Clone)]
struct Captured {
    channel_id: u64,
    authorization: Option<String>,
    body: Value,
}

type Log = Arc<Mutex<Vec<Captured>>>;

async fn create_message(
    State(log): State<Log>,
    Path(channel_id): Path<u64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    log.lock().push(Captured {
        channel_id,
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    (StatusCode::OK, Json(json!({ "id": "1" })))
}

fn notifier(base: &str) -> DiscordNotifier {
    DiscordNotifier::new(
        base.to_string(),
        SecretString::new("test-token".to_string()),
        Duration::from_secs(2),
    )
    .unwrap()
}

#[tokio::test]
async fn test_message_is_posted_to_channel() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/channels/{channel_id}/messages", post(create_message))
        .with_state(log.clone());
    let base = spawn_server(app).await;

    notifier(&format!("{}/", base))
        .send(1234, "📈 **Floor Price Update**")
        .await
        .unwrap();

    let captured = log.lock().clone();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].channel_id, 1234);
    assert_eq!(captured[0].authorization.as_deref(), Some("Bot test-token"));
    assert_eq!(captured[0].body["content"], "📈 **Floor Price Update**");
}

#[tokio::test]
async fn test_rate_limit_is_reported() {
    let app = Router::new().route(
        "/channels/{channel_id}/messages",
        post(|| async {
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "message": "You are being rate limited.", "retry_after": 1.5, "global": false })),
            )
        }),
    );
    let base = spawn_server(app).await;

    let err = notifier(&base).send(1, "hi").await.unwrap_err();
    assert_eq!(
        err,
        DeliveryError::RateLimited {
            retry_after_secs: Some(1.5)
        }
    );
}

#[tokio::test]
async fn test_rejection_carries_status() {
    let app = Router::new().route(
        "/channels/{channel_id}/messages",
        post(|| async { (StatusCode::FORBIDDEN, "Missing Access") }),
    );
    let base = spawn_server(app).await;

    let err = notifier(&base).send(1, "hi").await.unwrap_err();
    match err {
        DeliveryError::Rejected { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "Missing Access");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_api_is_transport_error() {
    let err = notifier("http://127.0.0.1:9").send(1, "hi").await.unwrap_err();
    assert!(matches!(err, DeliveryError::Transport(_)));
}
