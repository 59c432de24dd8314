//! Store-then-publish ingestion
//!
//! A creation commits the record to the store first. Only a committed record
//! gets an envelope, and publishing runs on a tracked background task so the
//! caller never waits for the broker. Publish failures are logged and
//! counted, never reported back and never rolled back.

use crate::errors::{Result, ServiceError};
use crate::metrics::record_event;
use crate::publisher::EventPublisher;
use chrono::Utc;
use ledger_core::{EventEnvelope, EventType, NewTransaction, Transaction, TransactionStore};
use message_bus::{PublishError, PublishReceipt};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{error, info, info_span, Instrument};

/// A committed record plus the handle of its in-flight publish
#[derive(Debug)]
pub struct Committed {
    pub transaction: Transaction,
    pub publish: JoinHandle<std::result::Result<PublishReceipt, PublishError>>,
}

#[derive(Debug, Clone)]
pub struct IngestionCoordinator {
    store: TransactionStore,
    publisher: EventPublisher,
    service_id: String,
    tracker: TaskTracker,
}

impl IngestionCoordinator {
    pub fn new(store: TransactionStore, publisher: EventPublisher, service_id: impl Into<String>) -> Self {
        Self {
            store,
            publisher,
            service_id: service_id.into(),
            tracker: TaskTracker::new(),
        }
    }

    /// Decode a raw body and create it. Nothing is mutated when decoding fails.
    pub async fn create_from_json(&self, body: &[u8]) -> Result<Committed> {
        let submission = NewTransaction::from_json(body)
            .map_err(|e| ServiceError::Validation(validation_details(e)))?;
        self.create(submission).await
    }

    /// Commit a submission and schedule its event.
    ///
    /// Returns as soon as the record is in the store.
    pub async fn create(&self, submission: NewTransaction) -> Result<Committed> {
        submission
            .validate()
            .map_err(|e| ServiceError::Validation(validation_details(e)))?;

        let transaction = submission.into_transaction(Utc::now());
        self.store.append(transaction.clone()).await?;

        info!(
            transaction_id = %transaction.id,
            user_id = transaction.user_id,
            "Transaction committed"
        );

        let publish = self.spawn_publish(transaction.clone());
        Ok(Committed {
            transaction,
            publish,
        })
    }

    fn spawn_publish(
        &self,
        transaction: Transaction,
    ) -> JoinHandle<std::result::Result<PublishReceipt, PublishError>> {
        let publisher = self.publisher.clone();
        let service_id = self.service_id.clone();
        let span = info_span!("publish_event", transaction_id = %transaction.id);

        self.tracker.spawn(
            async move {
                let envelope = EventEnvelope::build(
                    EventType::TransactionCreated,
                    transaction,
                    service_id,
                    Utc::now(),
                );
                let event_type = envelope.event_type.as_str();

                match publisher.publish(&envelope).await {
                    Ok(receipt) => {
                        record_event(event_type, "published");
                        info!(
                            subject = %receipt.subject,
                            attempts = receipt.attempts,
                            "Transaction event published"
                        );
                        Ok(receipt)
                    }
                    Err(e) => {
                        record_event(event_type, "failed");
                        error!(error = %e, kind = e.kind(), "Failed to publish transaction event");
                        Err(e)
                    }
                }
            }
            .instrument(span),
        )
    }

    /// First record with `id`
    pub async fn get(&self, id: &str) -> Result<Transaction> {
        Ok(self.store.get(id).await?)
    }

    /// Every record in insertion order
    pub async fn list(&self) -> Result<Vec<Transaction>> {
        Ok(self.store.list().await?)
    }

    pub fn store(&self) -> &TransactionStore {
        &self.store
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Publishes still running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting publish tasks and wait for the running ones.
    ///
    /// Returns false when `timeout` elapsed first.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            info!(pending, "Waiting for in-flight publishes");
        }
        tokio::time::timeout(timeout, self.tracker.wait()).await.is_ok()
    }
}

fn validation_details(err: ledger_core::Error) -> String {
    match err {
        ledger_core::Error::Validation(details) => details,
        other => other.to_string(),
    }
}
