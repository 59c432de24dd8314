//! Deadline-bounded publisher with optional retry
//!
//! Every call is bounded by `publish_timeout`, measured from call start and
//! covering all attempts and backoff sleeps. `max_retry_attempts = 1` gives
//! a single best-effort attempt.

use crate::{
    metrics::{MESSAGE_PUBLISH_ATTEMPTS, MESSAGE_PUBLISH_DURATION, MESSAGE_PUBLISH_TOTAL},
    partitioning::HashPartitioning,
    transport::Transport,
    Error, OutboundMessage, Result,
};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Publisher configuration
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Deadline for one publish call, retries included
    pub publish_timeout: Duration,

    /// Max attempts per call (1 = no retry)
    pub max_retry_attempts: u32,

    /// Initial retry delay
    pub initial_retry_delay: Duration,

    /// Max retry delay
    pub max_retry_delay: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            publish_timeout: Duration::from_secs(10),
            max_retry_attempts: 1,
            initial_retry_delay: Duration::from_millis(100),
            max_retry_delay: Duration::from_secs(2),
        }
    }
}

/// Outcome of a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Subject the message was routed to
    pub subject: String,

    /// Partition derived from the key
    pub partition: u32,

    /// Attempts used
    pub attempts: u32,
}

/// Message publisher
#[derive(Debug, Clone)]
pub struct Publisher {
    transport: Arc<dyn Transport>,
    partitioning: HashPartitioning,
    config: PublisherConfig,
}

impl Publisher {
    /// Create new publisher
    pub fn new(
        transport: Arc<dyn Transport>,
        partitioning: HashPartitioning,
        config: PublisherConfig,
    ) -> Self {
        Self {
            transport,
            partitioning,
            config,
        }
    }

    /// Underlying transport
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Publisher configuration
    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Publish message, bounded by the configured deadline
    pub async fn publish(&self, message: &OutboundMessage) -> Result<PublishReceipt> {
        let start = Instant::now();
        let partition = self.partitioning.partition(message.key_bytes());
        let subject = self.partitioning.subject(&message.topic, message.key_bytes());

        info!(
            "Publishing message {} to subject: {}",
            message.key, subject
        );

        let timeout = self.config.publish_timeout;
        let result = match tokio::time::timeout(timeout, self.publish_with_retry(&subject, message))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::DeadlineExceeded(timeout.as_millis() as u64)),
        };

        // Record metrics
        let duration = start.elapsed().as_secs_f64();
        MESSAGE_PUBLISH_DURATION
            .with_label_values(&[message.topic.as_str()])
            .observe(duration);

        let status = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        MESSAGE_PUBLISH_TOTAL
            .with_label_values(&[message.topic.as_str(), status])
            .inc();

        result.map(|attempts| PublishReceipt {
            subject,
            partition,
            attempts,
        })
    }

    /// Publish with exponential backoff retry, returning attempts used
    async fn publish_with_retry(&self, subject: &str, message: &OutboundMessage) -> Result<u32> {
        let max_attempts = self.config.max_retry_attempts.max(1);
        let mut attempts = 0;
        let mut delay = self.config.initial_retry_delay;

        loop {
            attempts += 1;
            MESSAGE_PUBLISH_ATTEMPTS
                .with_label_values(&[message.topic.as_str()])
                .inc();

            match self.transport.send(subject, message).await {
                Ok(()) => {
                    if attempts > 1 {
                        info!("Message {} published after {} attempts", message.key, attempts);
                    }
                    return Ok(attempts);
                }
                Err(e) => {
                    if attempts >= max_attempts || !e.is_retryable() {
                        error!(
                            "Failed to publish {} after {} attempts: {}",
                            message.key, attempts, e
                        );
                        return Err(e);
                    }

                    let sleep = jittered(delay);
                    warn!(
                        "Publish failed (attempt {}), retrying in {:?}: {}",
                        attempts, sleep, e
                    );
                    tokio::time::sleep(sleep).await;

                    // Exponential backoff
                    delay = (delay * 2).min(self.config.max_retry_delay);
                }
            }
        }
    }
}

/// Full jitter: uniform in `[0, delay]`
fn jittered(delay: Duration) -> Duration {
    let max_ms = delay.as_millis() as u64;
    if max_ms == 0 {
        return delay;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}
