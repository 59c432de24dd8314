//! Message Bus with NATS support
//!
//! Provides keyed, at-least-once publishing with:
//! - Hash partitioning so every message for a key lands on one subject
//! - JetStream publish acknowledgements (or plain core NATS)
//! - Deadline-bounded publishes with optional jittered retry
//! - Observability via Prometheus metrics

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod client;
pub mod error;
pub mod message;
pub mod metrics;
pub mod partitioning;
pub mod publisher;
pub mod transport;

pub use client::{NatsClient, NatsConfig};
pub use error::{Error, PublishError, Result};
pub use message::OutboundMessage;
pub use partitioning::HashPartitioning;
pub use publisher::{PublishReceipt, Publisher, PublisherConfig};
pub use transport::{
    CoreNatsTransport, DeliveredMessage, InMemoryTransport, JetStreamTransport, Transport,
};
