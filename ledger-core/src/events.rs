//! Event envelopes emitted for committed transactions
//!
//! Envelopes are derived from committed records, serialized once and handed
//! to the message bus. They are never stored.

use crate::types::Transaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle moment an envelope describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A transaction was committed to the store
    TransactionCreated,
}

impl EventType {
    /// Wire name, also used for the `event-type` header
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::TransactionCreated => "transaction_created",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction snapshot wrapped with event metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Lifecycle classification
    pub event_type: EventType,

    /// Record snapshot at publish time
    pub transaction: Transaction,

    /// Emitting service instance
    pub service_id: String,

    /// Construction instant, never earlier than the record's own timestamp
    #[serde(rename = "timestamp", alias = "emitted_at")]
    pub emitted_at: DateTime<Utc>,
}

impl EventEnvelope {
    /// Build an envelope. Pure apart from the injected `now`.
    ///
    /// A record stamped in the future by its caller pushes `emitted_at`
    /// forward to that stamp. Comparison is on the instant, whatever offset
    /// the record's timestamp was written with.
    pub fn build(
        event_type: EventType,
        transaction: Transaction,
        service_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let emitted_at = now.max(transaction.timestamp.instant());
        Self {
            event_type,
            transaction,
            service_id: service_id.into(),
            emitted_at,
        }
    }

    /// Partition/ordering key: the transaction id
    pub fn key(&self) -> &str {
        &self.transaction.id
    }
}
