use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use sea_orm::Database;
use tower::ServiceExt;

use engine::{Engine, EngineError, Provider, TransactionStatus};
use migration::MigratorTrait;
use server::{ServerState, WebhookConfig, router};

async fn state_with(webhooks: WebhookConfig) -> ServerState {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build().unwrap();
    ServerState {
        engine: Arc::new(engine),
        db,
        webhooks: Arc::new(webhooks),
    }
}

fn yookassa_state_secret() -> WebhookConfig {
    WebhookConfig {
        yookassa_secret: Some("hunter2".to_string()),
        stars_secret: None,
    }
}

fn post(uri: &str, secret: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(secret) = secret {
        builder = builder.header("x-webhook-secret", secret);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn ack_status(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    json["status"].as_str().unwrap_or_default().to_string()
}

const SUCCEEDED_BODY: &str = r#"{
    "event": "payment.succeeded",
    "object": {
        "id": "pay-1",
        "status": "succeeded",
        "paid": true,
        "amount": { "value": "100.00", "currency": "RUB" },
        "metadata": { "user_id": "42" }
    }
}"#;

const CANCELED_BODY: &str = r#"{
    "event": "payment.canceled",
    "object": {
        "id": "pay-1",
        "status": "canceled",
        "paid": false,
        "amount": { "value": "100.00", "currency": "RUB" },
        "metadata": { "user_id": "42" }
    }
}"#;

#[tokio::test]
async fn yookassa_valid_secret_credits_balance() {
    let state = state_with(yookassa_state_secret()).await;

    let response = router(state.clone())
        .oneshot(post("/webhooks/yookassa", Some("hunter2"), SUCCEEDED_BODY))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ack_status(response).await, "applied");

    assert_eq!(state.engine.balance(42).await.unwrap(), 10000);
    let tx = state
        .engine
        .transaction_by_key(Provider::Yookassa, "pay-1")
        .await
        .unwrap();
    assert_eq!(tx.status, TransactionStatus::Succeeded);
}

#[tokio::test]
async fn yookassa_bad_or_missing_secret_is_rejected() {
    let state = state_with(yookassa_state_secret()).await;

    let response = router(state.clone())
        .oneshot(post("/webhooks/yookassa", Some("wrong"), SUCCEEDED_BODY))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = router(state.clone())
        .oneshot(post("/webhooks/yookassa", None, SUCCEEDED_BODY))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // No ledger effect from rejected deliveries.
    assert_eq!(state.engine.balance(42).await.unwrap(), 0);
    assert!(matches!(
        state
            .engine
            .transaction_by_key(Provider::Yookassa, "pay-1")
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn yookassa_unconfigured_secret_rejects_everything() {
    let state = state_with(WebhookConfig::default()).await;

    let response = router(state.clone())
        .oneshot(post("/webhooks/yookassa", Some("anything"), SUCCEEDED_BODY))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn yookassa_malformed_payload_is_client_error() {
    let state = state_with(yookassa_state_secret()).await;

    let response = router(state.clone())
        .oneshot(post("/webhooks/yookassa", Some("hunter2"), "not json at all"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Parseable JSON but no forwarded user id: will never apply, so the
    // provider must not keep retrying it.
    let body = r#"{
        "event": "payment.succeeded",
        "object": {
            "id": "pay-2",
            "status": "succeeded",
            "paid": true,
            "amount": { "value": "100.00", "currency": "RUB" }
        }
    }"#;
    let response = router(state.clone())
        .oneshot(post("/webhooks/yookassa", Some("hunter2"), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn yookassa_duplicate_delivery_is_acknowledged_once_applied() {
    let state = state_with(yookassa_state_secret()).await;

    let first = router(state.clone())
        .oneshot(post("/webhooks/yookassa", Some("hunter2"), SUCCEEDED_BODY))
        .await
        .unwrap();
    assert_eq!(ack_status(first).await, "applied");

    for _ in 0..2 {
        let replay = router(state.clone())
            .oneshot(post("/webhooks/yookassa", Some("hunter2"), SUCCEEDED_BODY))
            .await
            .unwrap();
        assert_eq!(replay.status(), StatusCode::OK);
        assert_eq!(ack_status(replay).await, "already_applied");
    }

    assert_eq!(state.engine.balance(42).await.unwrap(), 10000);
}

#[tokio::test]
async fn yookassa_unknown_event_is_acknowledged_without_effect() {
    let state = state_with(yookassa_state_secret()).await;

    let body = r#"{"event":"refund.succeeded","object":{"id":"r-1"}}"#;
    let response = router(state.clone())
        .oneshot(post("/webhooks/yookassa", Some("hunter2"), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ack_status(response).await, "ignored");

    assert_eq!(state.engine.balance(42).await.unwrap(), 0);
}

#[tokio::test]
async fn yookassa_conflicting_event_is_acknowledged_and_discarded() {
    let state = state_with(yookassa_state_secret()).await;

    let first = router(state.clone())
        .oneshot(post("/webhooks/yookassa", Some("hunter2"), SUCCEEDED_BODY))
        .await
        .unwrap();
    assert_eq!(ack_status(first).await, "applied");

    // A cancellation arriving after settlement is an anomaly, but the
    // provider still needs a success status to stop retrying.
    let conflict = router(state.clone())
        .oneshot(post("/webhooks/yookassa", Some("hunter2"), CANCELED_BODY))
        .await
        .unwrap();
    assert_eq!(conflict.status(), StatusCode::OK);
    assert_eq!(ack_status(conflict).await, "discarded");

    assert_eq!(state.engine.balance(42).await.unwrap(), 10000);
    let tx = state
        .engine
        .transaction_by_key(Provider::Yookassa, "pay-1")
        .await
        .unwrap();
    assert_eq!(tx.status, TransactionStatus::Succeeded);
}

const STARS_BODY: &str = r#"{
    "kind": "successful_payment",
    "telegram_payment_charge_id": "ch-1",
    "from_user_id": 42,
    "total_amount": 5,
    "currency": "XTR",
    "invoice_payload": "topup:5"
}"#;

#[tokio::test]
async fn stars_payment_credits_balance() {
    let state = state_with(WebhookConfig::default()).await;

    let response = router(state.clone())
        .oneshot(post("/webhooks/stars", None, STARS_BODY))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ack_status(response).await, "applied");

    assert_eq!(state.engine.balance(42).await.unwrap(), 5);
    let tx = state
        .engine
        .transaction_by_key(Provider::Stars, "ch-1")
        .await
        .unwrap();
    assert_eq!(tx.status, TransactionStatus::Succeeded);
}

#[tokio::test]
async fn stars_secret_is_enforced_when_configured() {
    let state = state_with(WebhookConfig {
        yookassa_secret: None,
        stars_secret: Some("bot-link".to_string()),
    })
    .await;

    let response = router(state.clone())
        .oneshot(post("/webhooks/stars", Some("wrong"), STARS_BODY))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(state.engine.balance(42).await.unwrap(), 0);

    let response = router(state.clone())
        .oneshot(post("/webhooks/stars", Some("bot-link"), STARS_BODY))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.engine.balance(42).await.unwrap(), 5);
}

#[tokio::test]
async fn stars_other_update_kind_is_ignored() {
    let state = state_with(WebhookConfig::default()).await;

    let body = r#"{"kind":"refunded_payment","telegram_payment_charge_id":"ch-1"}"#;
    let response = router(state.clone())
        .oneshot(post("/webhooks/stars", None, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ack_status(response).await, "ignored");
    assert_eq!(state.engine.balance(42).await.unwrap(), 0);
}

#[tokio::test]
async fn health_reports_database() {
    let state = state_with(WebhookConfig::default()).await;

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], true);
}
