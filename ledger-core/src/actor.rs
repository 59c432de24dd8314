//! Actor-based concurrency for the transaction store
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One task owns the records, so appends never race or get lost
//! - Reads go through the same mailbox and see a consistent snapshot
//! - Bounded mailbox gives backpressure under load
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │            HTTP handlers / coordinator                │
//! │           one task per inbound request                │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               StoreHandle (Clone)                     │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               StoreActor (Single Task)                │
//! │   records: Vec<Transaction>   (insertion order)      │
//! │   index:   HashMap<id, first position>               │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::types::Transaction;
use crate::{Error, Result};
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the store actor
#[derive(Debug)]
pub enum StoreMessage {
    /// Append a record
    Append {
        /// Record to append
        transaction: Transaction,
        /// Reply channel
        response: oneshot::Sender<Result<usize>>,
    },

    /// Look up the first record with an id
    Get {
        /// Record id
        id: String,
        /// Reply channel
        response: oneshot::Sender<Result<Transaction>>,
    },

    /// Snapshot of every record in insertion order
    List {
        /// Reply channel
        response: oneshot::Sender<Vec<Transaction>>,
    },

    /// Number of records
    Len {
        /// Reply channel
        response: oneshot::Sender<usize>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns the records
#[derive(Debug)]
pub struct StoreActor {
    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<StoreMessage>,

    /// Records in insertion order
    records: Vec<Transaction>,

    /// Position of the first record for each id
    index: HashMap<String, usize>,

    /// Reject duplicate ids
    enforce_unique_ids: bool,
}

impl StoreActor {
    /// Create new actor
    pub fn new(
        mailbox: mpsc::Receiver<StoreMessage>,
        initial: Vec<Transaction>,
        enforce_unique_ids: bool,
    ) -> Self {
        let mut actor = Self {
            mailbox,
            records: Vec::with_capacity(initial.len()),
            index: HashMap::with_capacity(initial.len()),
            enforce_unique_ids,
        };
        for transaction in initial {
            if let Err(e) = actor.append(transaction) {
                tracing::warn!("Skipping seed record: {}", e);
            }
        }
        actor
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                StoreMessage::Shutdown => break,
                msg => self.handle_message(msg),
            }
        }

        tracing::debug!(records = self.records.len(), "Store actor stopped");
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: StoreMessage) {
        match msg {
            StoreMessage::Append {
                transaction,
                response,
            } => {
                let _ = response.send(self.append(transaction));
            }

            StoreMessage::Get { id, response } => {
                let result = self
                    .index
                    .get(&id)
                    .map(|&pos| self.records[pos].clone())
                    .ok_or(Error::TransactionNotFound(id));
                let _ = response.send(result);
            }

            StoreMessage::List { response } => {
                let _ = response.send(self.records.clone());
            }

            StoreMessage::Len { response } => {
                let _ = response.send(self.records.len());
            }

            StoreMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    /// Append, returning the new record count
    fn append(&mut self, transaction: Transaction) -> Result<usize> {
        if self.enforce_unique_ids && self.index.contains_key(&transaction.id) {
            return Err(Error::DuplicateTransaction(transaction.id));
        }

        let position = self.records.len();
        // Later duplicates (permissive mode) keep the first position indexed.
        self.index.entry(transaction.id.clone()).or_insert(position);
        self.records.push(transaction);

        Ok(self.records.len())
    }
}

/// Handle for sending messages to the actor
#[derive(Debug, Clone)]
pub struct StoreHandle {
    sender: mpsc::Sender<StoreMessage>,
}

impl StoreHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<StoreMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> StoreMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(make(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Append a record, returning the new record count
    pub async fn append(&self, transaction: Transaction) -> Result<usize> {
        self.request(|response| StoreMessage::Append {
            transaction,
            response,
        })
        .await?
    }

    /// Get the first record with `id`
    pub async fn get(&self, id: impl Into<String>) -> Result<Transaction> {
        let id = id.into();
        self.request(|response| StoreMessage::Get { id, response })
            .await?
    }

    /// Snapshot in insertion order
    pub async fn list(&self) -> Result<Vec<Transaction>> {
        self.request(|response| StoreMessage::List { response })
            .await
    }

    /// Number of records
    pub async fn len(&self) -> Result<usize> {
        self.request(|response| StoreMessage::Len { response })
            .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(StoreMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the store actor
pub fn spawn_store_actor(
    mailbox_capacity: usize,
    initial: Vec<Transaction>,
    enforce_unique_ids: bool,
) -> StoreHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity);
    let actor = StoreActor::new(rx, initial, enforce_unique_ids);

    tokio::spawn(async move {
        actor.run().await;
    });

    StoreHandle::new(tx)
}
