//! Event publishing on top of the message bus
//!
//! Maps an envelope onto an outbound message: keyed by transaction id,
//! carrying `event-type` and `user-id` headers next to the bus-level
//! `message-key` header.

use ledger_core::EventEnvelope;
use message_bus::{OutboundMessage, PublishError, PublishReceipt, Publisher};

/// Header carrying the envelope's lifecycle type
pub const EVENT_TYPE_HEADER: &str = "event-type";

/// Header carrying the owning user id
pub const USER_ID_HEADER: &str = "user-id";

/// Publishes transaction events to one topic
#[derive(Debug, Clone)]
pub struct EventPublisher {
    publisher: Publisher,
    topic: String,
}

impl EventPublisher {
    pub fn new(publisher: Publisher, topic: impl Into<String>) -> Self {
        Self {
            publisher,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Serialize an envelope into a keyed message with routing headers
    pub fn to_message(&self, envelope: &EventEnvelope) -> Result<OutboundMessage, PublishError> {
        Ok(OutboundMessage::json(&self.topic, envelope.key(), envelope)?
            .with_header(EVENT_TYPE_HEADER, envelope.event_type.as_str())
            .with_header(USER_ID_HEADER, envelope.transaction.user_id.to_string()))
    }

    /// Publish one envelope, bounded by the bus deadline
    pub async fn publish(&self, envelope: &EventEnvelope) -> Result<PublishReceipt, PublishError> {
        let message = self.to_message(envelope)?;
        self.publisher.publish(&message).await
    }

    /// Whether the underlying transport reports a live connection
    pub fn is_connected(&self) -> bool {
        self.publisher.transport().is_connected()
    }

    /// Transport name for health output
    pub fn transport_name(&self) -> &'static str {
        self.publisher.transport().name()
    }
}
