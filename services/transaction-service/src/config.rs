use config::{ConfigError, Environment, File};
use ledger_core::StoreConfig;
use message_bus::{NatsConfig, PublisherConfig};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub service: ServiceConfig,
    pub broker: BrokerConfig,
    pub publisher: PublishSettings,
    pub store: StoreConfig,
    pub shutdown: ShutdownConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Emitting service instance, stamped on every envelope
    pub id: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// JetStream with publish acknowledgements
    Jetstream,
    /// Core NATS, no acknowledgement
    Nats,
    /// In-process, for local runs without a broker
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BrokerConfig {
    /// Comma-separated broker URLs
    pub urls: String,
    pub transport: TransportKind,
    pub topic: String,
    pub stream_name: String,
    pub partitions: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PublishSettings {
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub initial_retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShutdownConfig {
    /// Upper bound on waiting for in-flight publishes
    pub drain_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub json: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut builder = Self::defaults()?;

        // Add environment-specific config file if it exists
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&config_file).required(false));
        } else {
            builder = builder.add_source(
                File::with_name(&format!("config/{}", environment)).required(false),
            );
        }

        // Override with environment variables
        builder = builder.add_source(
            Environment::with_prefix("TRANSACTION_SERVICE")
                .separator("__")
                .try_parsing(true),
        );

        // Special handling for common env vars
        if let Ok(urls) = env::var("BROKER_URLS").or_else(|_| env::var("NATS_URL")) {
            builder = builder.set_override("broker.urls", urls)?;
        }

        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        if let Ok(service_id) = env::var("SERVICE_ID") {
            builder = builder.set_override("service.id", service_id)?;
        }

        builder.build()?.try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("service.id", "transaction-service")?
            .set_default("broker.urls", "nats://0.0.0.0:4222")?
            .set_default("broker.transport", "jetstream")?
            .set_default("broker.topic", "transactions")?
            .set_default("broker.stream_name", "TRANSACTIONS")?
            .set_default("broker.partitions", 16)?
            .set_default("broker.connect_timeout_secs", 5)?
            .set_default("publisher.timeout_secs", 10)?
            .set_default("publisher.max_attempts", 1)?
            .set_default("publisher.initial_retry_delay_ms", 100)?
            .set_default("publisher.max_retry_delay_ms", 2000)?
            .set_default("store.mailbox_capacity", 1024)?
            .set_default("store.enforce_unique_ids", true)?
            .set_default("store.seed_demo_data", false)?
            .set_default("shutdown.drain_timeout_secs", 15)?
            .set_default("logging.json", false)
    }

    /// Built-in defaults only, ignoring files and environment
    pub fn default_values() -> Result<Self, ConfigError> {
        Self::defaults()?.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }

        if self.service.id.trim().is_empty() {
            return Err("Service id is required".to_string());
        }

        if self.broker.transport != TransportKind::Memory && self.broker.urls.trim().is_empty() {
            return Err("Broker URLs are required".to_string());
        }

        if self.broker.topic.trim().is_empty() {
            return Err("Broker topic is required".to_string());
        }

        if self.broker.partitions == 0 {
            return Err("Broker partitions must be greater than 0".to_string());
        }

        if self.publisher.timeout_secs == 0 {
            return Err("Publish timeout must be greater than 0".to_string());
        }

        if self.publisher.max_attempts == 0 {
            return Err("Publish attempts must be at least 1".to_string());
        }

        self.store.validate().map_err(|e| e.to_string())?;

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn nats_config(&self) -> NatsConfig {
        NatsConfig {
            urls: self.broker.urls.clone(),
            client_name: self.service.id.clone(),
            connect_timeout: Duration::from_secs(self.broker.connect_timeout_secs),
        }
    }

    pub fn publisher_config(&self) -> PublisherConfig {
        PublisherConfig {
            publish_timeout: Duration::from_secs(self.publisher.timeout_secs),
            max_retry_attempts: self.publisher.max_attempts,
            initial_retry_delay: Duration::from_millis(self.publisher.initial_retry_delay_ms),
            max_retry_delay: Duration::from_millis(self.publisher.max_retry_delay_ms),
        }
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown.drain_timeout_secs)
    }
}
