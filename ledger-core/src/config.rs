//! Configuration for the transaction store

use serde::{Deserialize, Serialize};

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Bounded mailbox size for the store actor (backpressure)
    pub mailbox_capacity: usize,

    /// Reject a second record with an id that is already stored
    pub enforce_unique_ids: bool,

    /// Pre-populate the store with demo fixtures
    pub seed_demo_data: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1024,
            enforce_unique_ids: true,
            seed_demo_data: false,
        }
    }
}

impl StoreConfig {
    /// Permissive store: duplicate ids become independent entries
    pub fn permissive() -> Self {
        Self {
            enforce_unique_ids: false,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "Store mailbox capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
