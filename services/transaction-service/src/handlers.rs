use crate::coordinator::IngestionCoordinator;
use crate::errors::{Result, ServiceError};
use crate::metrics;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use ledger_core::Transaction;
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct AppState {
    pub coordinator: IngestionCoordinator,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
    pub transport: &'static str,
    pub broker_connected: bool,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/transactions/:id", get(get_transaction))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> &'static str {
    "Welcome to the Transaction Service!"
}

// Health check endpoint. The service stays healthy while the broker is
// down; ingestion does not depend on it.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let publisher = state.coordinator.publisher();

    Json(HealthResponse {
        status: "healthy",
        service: state.coordinator.service_id().to_string(),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
        transport: publisher.transport_name(),
        broker_connected: publisher.is_connected(),
    })
}

// Prometheus metrics endpoint
async fn metrics_handler() -> Result<String> {
    metrics::export()
        .map_err(|e| ServiceError::Internal(format!("Failed to export metrics: {}", e)))
}

async fn list_transactions(State(state): State<AppState>) -> Result<Json<Vec<Transaction>>> {
    let transactions = state.coordinator.list().await?;
    debug!(count = transactions.len(), "Listing transactions");
    Ok(Json(transactions))
}

async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>> {
    let transaction = state.coordinator.get(&id).await?;
    Ok(Json(transaction))
}

// Raw bytes so decode failures map onto the service's own 400 body
async fn create_transaction(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Transaction>)> {
    let committed = state.coordinator.create_from_json(&body).await?;
    Ok((StatusCode::CREATED, Json(committed.transaction)))
}
