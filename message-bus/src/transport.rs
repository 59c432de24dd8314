//! Broker transports
//!
//! A transport delivers one already-routed message and reports whether the
//! broker accepted it. Retry and deadlines live in the publisher.

use crate::{client::NatsClient, Error, OutboundMessage, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

/// Broker transport
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Deliver `message` on `subject`
    async fn send(&self, subject: &str, message: &OutboundMessage) -> Result<()>;

    /// Whether the transport currently reaches its broker
    fn is_connected(&self) -> bool;

    /// Transport name for logs
    fn name(&self) -> &'static str;
}

fn nats_headers(message: &OutboundMessage) -> Result<async_nats::HeaderMap> {
    message.validate_headers()?;

    let mut headers = async_nats::HeaderMap::new();
    for (name, value) in message.wire_headers() {
        headers.insert(name, value);
    }
    Ok(headers)
}

/// JetStream transport: waits for the stream's publish acknowledgement
#[derive(Debug, Clone)]
pub struct JetStreamTransport {
    client: NatsClient,
}

impl JetStreamTransport {
    /// Create new transport
    pub fn new(client: NatsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for JetStreamTransport {
    async fn send(&self, subject: &str, message: &OutboundMessage) -> Result<()> {
        let ack = self
            .client
            .jetstream()
            .publish_with_headers(subject.to_string(), nats_headers(message)?, message.payload.clone())
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let ack = ack
            .await
            .map_err(|e| Error::Transport(format!("Publish ack failed: {}", e)))?;

        debug!(stream = %ack.stream, sequence = ack.sequence, "JetStream ack received");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    fn name(&self) -> &'static str {
        "jetstream"
    }
}

/// Core NATS transport: fire and flush, no broker acknowledgement
#[derive(Debug, Clone)]
pub struct CoreNatsTransport {
    client: NatsClient,
}

impl CoreNatsTransport {
    /// Create new transport
    pub fn new(client: NatsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for CoreNatsTransport {
    async fn send(&self, subject: &str, message: &OutboundMessage) -> Result<()> {
        let client = self.client.client();

        client
            .publish_with_headers(subject.to_string(), nats_headers(message)?, message.payload.clone())
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        // Flush to ensure sent
        client
            .flush()
            .await
            .map_err(|e| Error::Transport(format!("Flush failed: {}", e)))?;

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    fn name(&self) -> &'static str {
        "nats"
    }
}

/// Message accepted by the in-memory transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredMessage {
    /// Subject the message was routed to
    pub subject: String,

    /// The message
    pub message: OutboundMessage,
}

/// In-process transport for local runs and tests.
///
/// Supports failure injection (`fail_next`, `set_offline`) and artificial
/// latency.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    delivered: Mutex<Vec<DeliveredMessage>>,
    failures_remaining: AtomicU32,
    offline: AtomicBool,
    latency: Duration,
    notify: Notify,
}

impl InMemoryTransport {
    /// Create new transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every send by `latency`
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Fail the next `n` sends with a transport error
    pub fn fail_next(&self, n: u32) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    /// Fail every send until switched back
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Messages accepted so far, in acceptance order
    pub fn delivered(&self) -> Vec<DeliveredMessage> {
        self.delivered.lock().clone()
    }

    /// Wait until at least `count` messages were accepted
    pub async fn wait_for(&self, count: usize) -> Vec<DeliveredMessage> {
        loop {
            let notified = self.notify.notified();
            {
                let delivered = self.delivered.lock();
                if delivered.len() >= count {
                    return delivered.clone();
                }
            }
            notified.await;
        }
    }

    fn take_failure(&self) -> bool {
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn send(&self, subject: &str, message: &OutboundMessage) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        message.validate_headers()?;

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Connection("broker offline".to_string()));
        }
        if self.take_failure() {
            return Err(Error::Transport("injected failure".to_string()));
        }

        self.delivered.lock().push(DeliveredMessage {
            subject: subject.to_string(),
            message: message.clone(),
        });
        self.notify.notify_waiters();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        !self.offline.load(Ordering::SeqCst)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
