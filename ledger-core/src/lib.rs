//! DelTran Transaction Ledger Core
//!
//! In-memory transaction ledger with a single-writer store and the
//! event envelopes emitted for downstream consumers.
//!
//! # Architecture
//!
//! - **Single Writer**: One actor task owns the records and serializes
//!   every append, lookup and listing
//! - **Append-only**: Records are never updated or deleted
//! - **Derived events**: Envelopes are built from committed records and
//!   never stored
//!
//! # Invariants
//!
//! - Insertion order: `list()` returns records in the order they were appended
//! - Stable identity: a record's `id` never changes once appended
//! - No lost updates: concurrent appends all land in the store

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod store;
pub mod types;

// Re-exports
pub use config::StoreConfig;
pub use error::{Error, Result};
pub use events::{EventEnvelope, EventType};
pub use store::TransactionStore;
pub use types::{Amount, NewTransaction, Timestamp, Transaction};
