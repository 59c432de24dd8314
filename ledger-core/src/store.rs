//! Transaction store
//!
//! Public face of the ledger: append, lookup and listing on top of the
//! single-writer actor. The backing container is never exposed.
//!
//! # Example
//!
//! ```no_run
//! use ledger_core::{StoreConfig, TransactionStore};
//!
//! #[tokio::main]
//! async fn main() -> ledger_core::Result<()> {
//!     let store = TransactionStore::open(StoreConfig::default())?;
//!
//!     // let txn = ...;
//!     // store.append(txn).await?;
//!
//!     println!("{} transactions", store.len().await?);
//!     Ok(())
//! }
//! ```

use crate::{
    actor::{spawn_store_actor, StoreHandle},
    metrics::{record_append, STORE_SIZE},
    types::{demo_transactions, Transaction},
    Error, Result, StoreConfig,
};
use std::time::Instant;
use tracing::{debug, warn};

/// In-process, append-only transaction store
#[derive(Debug, Clone)]
pub struct TransactionStore {
    /// Actor handle
    handle: StoreHandle,

    /// Configuration
    config: StoreConfig,
}

impl TransactionStore {
    /// Spawn the backing actor. Must be called inside a Tokio runtime.
    pub fn open(config: StoreConfig) -> Result<Self> {
        config.validate()?;

        let initial = if config.seed_demo_data {
            demo_transactions()
        } else {
            Vec::new()
        };
        STORE_SIZE.set(initial.len() as i64);

        let handle = spawn_store_actor(config.mailbox_capacity, initial, config.enforce_unique_ids);

        Ok(Self { handle, config })
    }

    /// Append a record.
    ///
    /// Returns once the record is visible to every subsequent `get`/`list`.
    /// Fails only with `DuplicateTransaction` (strict mode) or when the
    /// store has been shut down.
    pub async fn append(&self, transaction: Transaction) -> Result<()> {
        let start = Instant::now();
        let id = transaction.id.clone();

        let result = self.handle.append(transaction).await;
        let elapsed = start.elapsed().as_secs_f64();

        match result {
            Ok(count) => {
                record_append("committed", elapsed);
                STORE_SIZE.set(count as i64);
                debug!(transaction_id = %id, records = count, "Transaction appended");
                Ok(())
            }
            Err(e @ Error::DuplicateTransaction(_)) => {
                record_append("duplicate", elapsed);
                warn!(transaction_id = %id, "Rejected duplicate transaction id");
                Err(e)
            }
            Err(e) => {
                record_append("error", elapsed);
                Err(e)
            }
        }
    }

    /// First record with `id` in insertion order
    pub async fn get(&self, id: &str) -> Result<Transaction> {
        self.handle.get(id).await
    }

    /// Snapshot of every record in insertion order
    pub async fn list(&self) -> Result<Vec<Transaction>> {
        self.handle.list().await
    }

    /// Number of records
    pub async fn len(&self) -> Result<usize> {
        self.handle.len().await
    }

    /// True when no record has been appended
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Configuration in effect
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Stop the backing actor
    pub async fn shutdown(&self) -> Result<()> {
        self.handle.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn txn(id: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            user_id: 42,
            amount: "-2.50".parse().unwrap(),
            currency: "EUR".to_string(),
            kind: "debit".to_string(),
            metadata: BTreeMap::from([("merchant".to_string(), "Shop".to_string())]),
            timestamp: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_open_empty() {
        let store = TransactionStore::open(StoreConfig::default()).unwrap();
        assert!(store.is_empty().await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_seeded() {
        let config = StoreConfig {
            seed_demo_data: true,
            ..StoreConfig::default()
        };
        let store = TransactionStore::open(config).unwrap();
        assert_eq!(store.len().await.unwrap(), 3);
        assert!(store.get("9b2c85f0-7641-45f0-bf21-219a93c20f5f").await.is_ok());
    }

    #[tokio::test]
    async fn test_append_get_list() {
        let store = TransactionStore::open(StoreConfig::default()).unwrap();

        store.append(txn("t1")).await.unwrap();
        store.append(txn("t2")).await.unwrap();

        let fetched = store.get("t1").await.unwrap();
        assert_eq!(fetched.id, "t1");
        assert_eq!(fetched.metadata["merchant"], "Shop");

        let ids: Vec<_> = store.list().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn test_duplicate_rejected_without_mutation() {
        let store = TransactionStore::open(StoreConfig::default()).unwrap();
        store.append(txn("dup")).await.unwrap();

        let result = store.append(txn("dup")).await;
        assert!(matches!(result, Err(Error::DuplicateTransaction(ref id)) if id == "dup"));
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_permissive_store_keeps_duplicates() {
        let store = TransactionStore::open(StoreConfig::permissive()).unwrap();
        store.append(txn("dup")).await.unwrap();
        store.append(txn("dup")).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = StoreConfig {
            mailbox_capacity: 0,
            ..StoreConfig::default()
        };
        assert!(TransactionStore::open(config).is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_not_lost() {
        let store = TransactionStore::open(StoreConfig::default()).unwrap();

        let tasks: Vec<_> = (0..200)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.append(txn(&format!("c{}", i))).await })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.len().await.unwrap(), 200);
    }
}
