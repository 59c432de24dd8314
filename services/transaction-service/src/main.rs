// Transaction Service - ingestion entry point
// Commits transactions to the in-process ledger and publishes events to the message bus

use anyhow::Context;
use ledger_core::TransactionStore;
use message_bus::{
    CoreNatsTransport, HashPartitioning, InMemoryTransport, JetStreamTransport, NatsClient,
    Publisher, Transport,
};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use transaction_service::{
    config::{Config, TransportKind},
    create_router, telemetry, AppState, EventPublisher, IngestionCoordinator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    telemetry::init(config.logging.json);

    info!("Starting Transaction Service {}", config.service.id);

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    info!("Configuration loaded successfully");

    let transport = build_transport(&config).await?;
    let partitioning = HashPartitioning::new(config.broker.partitions)?;
    let publisher = EventPublisher::new(
        Publisher::new(transport, partitioning, config.publisher_config()),
        config.broker.topic.clone(),
    );

    let store = TransactionStore::open(config.store.clone())?;
    info!(
        enforce_unique_ids = config.store.enforce_unique_ids,
        seeded = config.store.seed_demo_data,
        "Transaction store ready"
    );

    let coordinator = IngestionCoordinator::new(store.clone(), publisher, config.service.id.clone());
    let app = create_router(AppState {
        coordinator: coordinator.clone(),
    });

    let bind_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Transaction Service listening on: {}", bind_addr);
    info!("   GET  /transactions - List transactions");
    info!("   GET  /transactions/:id - Get transaction");
    info!("   POST /transactions - Create transaction");
    info!("   GET  /health - Health check");
    info!("   GET  /metrics - Prometheus metrics");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, draining publishes");
    if !coordinator.drain(config.drain_timeout()).await {
        warn!(
            pending = coordinator.in_flight(),
            "Drain timeout elapsed with publishes still in flight"
        );
    }

    store.shutdown().await?;
    info!("Transaction Service stopped");

    Ok(())
}

async fn build_transport(config: &Config) -> anyhow::Result<Arc<dyn Transport>> {
    match config.broker.transport {
        TransportKind::Memory => {
            warn!("Using in-memory transport, events stay in this process");
            Ok(Arc::new(InMemoryTransport::new()))
        }
        TransportKind::Nats => {
            info!("Connecting to NATS: {}", config.broker.urls);
            let client = NatsClient::connect(&config.nats_config()).await?;
            Ok(Arc::new(CoreNatsTransport::new(client)))
        }
        TransportKind::Jetstream => {
            info!("Connecting to NATS JetStream: {}", config.broker.urls);
            let client = NatsClient::connect(&config.nats_config()).await?;

            let subjects = vec![HashPartitioning::wildcard(&config.broker.topic)];
            match client.ensure_stream(&config.broker.stream_name, subjects).await {
                Ok(()) => info!("Stream {} ready", config.broker.stream_name),
                Err(e) => error!(
                    "Failed to provision stream {}: {}",
                    config.broker.stream_name, e
                ),
            }

            Ok(Arc::new(JetStreamTransport::new(client)))
        }
    }
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
}
