//! End-to-end ingestion tests through the HTTP router
//!
//! Uses the in-memory transport so broker behaviour (failures, latency)
//! can be controlled per test.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use ledger_core::{EventEnvelope, StoreConfig, TransactionStore};
use message_bus::{HashPartitioning, InMemoryTransport, Publisher, PublisherConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use transaction_service::{
    create_router,
    publisher::{EVENT_TYPE_HEADER, USER_ID_HEADER},
    AppState, EventPublisher, IngestionCoordinator,
};

struct TestApp {
    router: Router,
    coordinator: IngestionCoordinator,
    transport: Arc<InMemoryTransport>,
}

fn test_app_with(transport: InMemoryTransport, publisher_config: PublisherConfig) -> TestApp {
    let transport = Arc::new(transport);
    let store = TransactionStore::open(StoreConfig::default()).unwrap();
    let publisher = EventPublisher::new(
        Publisher::new(transport.clone(), HashPartitioning::default(), publisher_config),
        "transactions",
    );
    let coordinator = IngestionCoordinator::new(store, publisher, "transaction-service-test");
    let router = create_router(AppState {
        coordinator: coordinator.clone(),
    });

    TestApp {
        router,
        coordinator,
        transport,
    }
}

fn test_app() -> TestApp {
    test_app_with(InMemoryTransport::new(), PublisherConfig::default())
}

fn example_body() -> Value {
    json!({
        "transaction_id": "b35d8def-0025-440f-9d0e-b0aab008a093",
        "user_id": 1009,
        "amount": 42.38,
        "currency": "KES",
        "type": "credit",
        "metadata": {"merchant": "Shopify"},
        "timestamp": "2025-08-27T15:42:57.289182Z"
    })
}

fn body_for(id: &str) -> Value {
    json!({
        "transaction_id": id,
        "user_id": 7,
        "amount": 10.5,
        "currency": "USD",
        "type": "debit",
        "metadata": {}
    })
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn get(router: &Router, path: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    send(router, request).await
}

async fn post_raw(router: &Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/transactions")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    send(router, request).await
}

async fn post(router: &Router, body: &Value) -> (StatusCode, Value) {
    post_raw(router, body.to_string()).await
}

#[tokio::test]
async fn test_create_then_get_returns_same_record() {
    let app = test_app();

    let (status, created) = post(&app.router, &example_body()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created, example_body());

    let (status, fetched) = get(
        &app.router,
        "/transactions/b35d8def-0025-440f-9d0e-b0aab008a093",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_list_preserves_creation_order() {
    let app = test_app();

    for id in ["a", "b", "c", "d"] {
        let (status, _) = post(&app.router, &body_for(id)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, listed) = get(&app.router, "/transactions").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["transaction_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c", "d"]);
}

#[tokio::test]
async fn test_empty_store_lists_empty_array() {
    let app = test_app();
    let (status, listed) = get(&app.router, "/transactions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_missing_timestamp_is_assigned_at_ingestion() {
    let app = test_app();

    let before = Utc::now();
    let (status, created) = post(&app.router, &body_for("t-assigned")).await;
    let after = Utc::now();
    assert_eq!(status, StatusCode::CREATED);

    let timestamp: DateTime<Utc> = created["timestamp"].as_str().unwrap().parse().unwrap();
    assert!(before <= timestamp && timestamp <= after);
}

#[tokio::test]
async fn test_explicit_timestamp_is_preserved() {
    let app = test_app();

    let (_, created) = post(&app.router, &example_body()).await;
    assert_eq!(created["timestamp"], "2025-08-27T15:42:57.289182Z");
}

#[tokio::test]
async fn test_timestamp_text_round_trips_unchanged() {
    let app = test_app();

    for (id, ts) in [
        ("ts-zero-fraction", "2025-08-27T15:42:57.000Z"),
        ("ts-short-fraction", "2025-08-27T15:42:57.1Z"),
        ("ts-offset", "2025-08-27T15:42:57+02:00"),
    ] {
        let mut body = body_for(id);
        body["timestamp"] = json!(ts);
        let (status, created) = post(&app.router, &body).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["timestamp"], ts);

        let (_, fetched) = get(&app.router, &format!("/transactions/{}", id)).await;
        assert_eq!(fetched["timestamp"], ts);
    }
}

#[tokio::test]
async fn test_amount_literal_round_trips_unchanged() {
    let app = test_app();

    for (i, amount) in [
        "1e-30",
        "1e30",
        "123456789012345678901234567890",
        "0.123456789012345678901234567890123",
    ]
    .into_iter()
    .enumerate()
    {
        let id = format!("amt-{}", i);
        let body = format!(
            r#"{{"transaction_id":"{}","user_id":7,"amount":{},"currency":"USD","type":"credit"}}"#,
            id, amount
        );
        let (status, _) = post_raw(&app.router, body).await;
        assert_eq!(status, StatusCode::CREATED, "{}", amount);

        let request = Request::builder()
            .uri(format!("/transactions/{}", id))
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8_lossy(&bytes);
        assert!(
            text.contains(&format!("\"amount\":{},", amount)),
            "{} came back as {}",
            amount,
            text
        );
    }

    let delivered = app.transport.wait_for(4).await;
    let first = delivered
        .iter()
        .find(|d| d.message.key == "amt-0")
        .unwrap();
    let payload = String::from_utf8_lossy(&first.message.payload).to_string();
    assert!(payload.contains("\"amount\":1e-30,"));
}

#[tokio::test]
async fn test_line_breaks_in_id_rejected() {
    let app = test_app();

    let (status, body) = post(&app.router, &body_for("a\r\nNats-Msg-Id: z")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid transaction data");

    let (_, listed) = get(&app.router, "/transactions").await;
    assert_eq!(listed, json!([]));
    assert!(app.coordinator.drain(Duration::from_secs(1)).await);
    assert!(app.transport.delivered().is_empty());
}

#[tokio::test]
async fn test_missing_id_is_generated() {
    let app = test_app();

    let mut body = body_for("unused");
    body.as_object_mut().unwrap().remove("transaction_id");
    let (status, created) = post(&app.router, &body).await;
    assert_eq!(status, StatusCode::CREATED);

    let id = created["transaction_id"].as_str().unwrap();
    assert!(!id.is_empty());
    let (status, _) = get(&app.router, &format!("/transactions/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_null_metadata_becomes_empty_object() {
    let app = test_app();

    let mut body = body_for("t-null-meta");
    body["metadata"] = Value::Null;
    let (status, created) = post(&app.router, &body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["metadata"], json!({}));
}

#[tokio::test]
async fn test_malformed_body_rejected_without_side_effects() {
    let app = test_app();

    let (status, body) = post_raw(&app.router, "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid transaction data");
    assert!(body["details"].is_string());

    let (status, _) = post(&app.router, &json!({"user_id": "seven", "amount": 1})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listed) = get(&app.router, "/transactions").await;
    assert_eq!(listed, json!([]));

    assert!(app.coordinator.drain(Duration::from_secs(1)).await);
    assert!(app.transport.delivered().is_empty());
}

#[tokio::test]
async fn test_unknown_id_returns_not_found() {
    let app = test_app();

    let (status, body) = get(&app.router, "/transactions/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Transaction not found."}));
}

#[tokio::test]
async fn test_duplicate_id_rejected() {
    let app = test_app();

    let (status, _) = post(&app.router, &body_for("dup")).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut second = body_for("dup");
    second["amount"] = json!(99);
    let (status, body) = post(&app.router, &second).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["transaction_id"], "dup");

    let (_, fetched) = get(&app.router, "/transactions/dup").await;
    assert_eq!(fetched["amount"], json!(10.5));
}

#[tokio::test]
async fn test_event_matches_committed_record() {
    let app = test_app();

    let (_, created) = post(&app.router, &example_body()).await;
    let delivered = app.transport.wait_for(1).await;
    assert_eq!(delivered.len(), 1);

    let message = &delivered[0].message;
    assert_eq!(message.topic, "transactions");
    assert_eq!(message.key, "b35d8def-0025-440f-9d0e-b0aab008a093");
    assert_eq!(message.header(EVENT_TYPE_HEADER), Some("transaction_created"));
    assert_eq!(message.header(USER_ID_HEADER), Some("1009"));

    let expected_subject = HashPartitioning::default().subject("transactions", message.key_bytes());
    assert_eq!(delivered[0].subject, expected_subject);

    let envelope: EventEnvelope = serde_json::from_slice(&message.payload).unwrap();
    assert_eq!(serde_json::to_value(&envelope.transaction).unwrap(), created);
    assert_eq!(envelope.service_id, "transaction-service-test");
    assert!(envelope.emitted_at >= envelope.transaction.timestamp.instant());

    let raw: Value = serde_json::from_slice(&message.payload).unwrap();
    assert_eq!(raw["event_type"], "transaction_created");
    assert!(raw["timestamp"].is_string());
}

#[tokio::test]
async fn test_broker_offline_still_commits() {
    let transport = InMemoryTransport::new();
    transport.set_offline(true);
    let app = test_app_with(transport, PublisherConfig::default());

    let (status, created) = post(&app.router, &body_for("offline")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, fetched) = get(&app.router, "/transactions/offline").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    assert!(app.coordinator.drain(Duration::from_secs(1)).await);
    assert!(app.transport.delivered().is_empty());
}

#[tokio::test]
async fn test_transient_failure_retried_when_enabled() {
    let transport = InMemoryTransport::new();
    transport.fail_next(1);
    let config = PublisherConfig {
        max_retry_attempts: 3,
        initial_retry_delay: Duration::from_millis(1),
        max_retry_delay: Duration::from_millis(5),
        ..PublisherConfig::default()
    };
    let app = test_app_with(transport, config);

    let (status, _) = post(&app.router, &body_for("retried")).await;
    assert_eq!(status, StatusCode::CREATED);

    let delivered = app.transport.wait_for(1).await;
    assert_eq!(delivered[0].message.key, "retried");
}

#[tokio::test]
async fn test_slow_broker_does_not_delay_response() {
    let app = test_app_with(
        InMemoryTransport::with_latency(Duration::from_secs(2)),
        PublisherConfig::default(),
    );

    let started = std::time::Instant::now();
    let (status, _) = post(&app.router, &body_for("slow")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(app.transport.delivered().is_empty());

    assert!(app.coordinator.drain(Duration::from_secs(5)).await);
    assert_eq!(app.transport.delivered().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_publish_deadline_bounds_hung_broker() {
    let config = PublisherConfig {
        publish_timeout: Duration::from_secs(10),
        ..PublisherConfig::default()
    };
    let app = test_app_with(InMemoryTransport::with_latency(Duration::from_secs(60)), config);

    let committed = app
        .coordinator
        .create_from_json(body_for("hung").to_string().as_bytes())
        .await
        .unwrap();

    let result = committed.publish.await.unwrap();
    assert!(matches!(result, Err(message_bus::Error::DeadlineExceeded(10_000))));
    assert_eq!(app.coordinator.list().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_creations_all_recorded() {
    let app = test_app();
    let k = 100;

    let tasks: Vec<_> = (0..k)
        .map(|i| {
            let router = app.router.clone();
            tokio::spawn(async move { post(&router, &body_for(&format!("c-{}", i))).await.0 })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::CREATED);
    }

    let (_, listed) = get(&app.router, "/transactions").await;
    assert_eq!(listed.as_array().unwrap().len(), k);

    assert!(app.coordinator.drain(Duration::from_secs(10)).await);
    assert_eq!(app.transport.delivered().len(), k);
}

#[tokio::test]
async fn test_health_and_index() {
    let app = test_app();

    let (status, health) = get(&app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["broker_connected"], true);
    assert_eq!(health["transport"], "memory");

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&text).contains("Transaction Service"));
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_counters() {
    let app = test_app();
    post(&app.router, &body_for("metered")).await;
    app.transport.wait_for(1).await;
    assert!(app.coordinator.drain(Duration::from_secs(1)).await);

    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8_lossy(&text);
    assert!(text.contains("ledger_store_appends_total"));
    assert!(text.contains("message_bus_publish_total"));
}
