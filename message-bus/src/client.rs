//! NATS client wrapper

use crate::{Error, Result};
use async_nats::jetstream::{
    self,
    stream::{Config as StreamConfig, RetentionPolicy, StorageType},
};
use std::time::Duration;
use tracing::{error, info};

/// NATS connection settings
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// Comma-separated server URLs
    pub urls: String,

    /// Client name reported to the server
    pub client_name: String,

    /// Per-attempt connection timeout
    pub connect_timeout: Duration,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            urls: "nats://0.0.0.0:4222".to_string(),
            client_name: "transaction-service".to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Connected NATS client with its JetStream context
#[derive(Debug, Clone)]
pub struct NatsClient {
    client: async_nats::Client,
    jetstream: jetstream::Context,
}

impl NatsClient {
    /// Connect to NATS.
    ///
    /// The server does not have to be up yet: the client keeps retrying in
    /// the background and publishes fail (and time out) until it is.
    pub async fn connect(config: &NatsConfig) -> Result<Self> {
        if config.urls.trim().is_empty() {
            return Err(Error::Config("NATS URLs are required".to_string()));
        }

        info!("Connecting to NATS at {}", config.urls);

        let client = async_nats::ConnectOptions::new()
            .name(&config.client_name)
            .connection_timeout(config.connect_timeout)
            .retry_on_initial_connect()
            .connect(config.urls.as_str())
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        let jetstream = jetstream::new(client.clone());

        Ok(Self { client, jetstream })
    }

    /// Core NATS client
    pub fn client(&self) -> &async_nats::Client {
        &self.client
    }

    /// JetStream context
    pub fn jetstream(&self) -> &jetstream::Context {
        &self.jetstream
    }

    /// Whether the connection is currently established
    pub fn is_connected(&self) -> bool {
        self.client.connection_state() == async_nats::connection::State::Connected
    }

    /// Create the stream capturing `subjects` if it does not exist yet
    pub async fn ensure_stream(&self, name: &str, subjects: Vec<String>) -> Result<()> {
        info!("Ensuring stream {} with subjects {:?}", name, subjects);

        let config = StreamConfig {
            name: name.to_string(),
            description: Some("Transaction lifecycle events".to_string()),
            subjects,
            retention: RetentionPolicy::Limits,
            storage: StorageType::File,
            max_age: Duration::from_secs(7 * 24 * 3600), // 7 days
            ..Default::default()
        };

        match self.jetstream.get_or_create_stream(config).await {
            Ok(_) => {
                info!("Stream {} ready", name);
                Ok(())
            }
            Err(e) => {
                error!("Failed to create stream {}: {}", name, e);
                Err(Error::StreamProvisioning(e.to_string()))
            }
        }
    }
}
