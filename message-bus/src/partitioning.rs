//! Key-hash partitioning for message routing
//!
//! Every message with the same key maps to the same partition and hence the
//! same broker subject, which is what preserves per-key ordering. Ordering
//! across keys is not guaranteed.

/// Hash-based partitioning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashPartitioning {
    num_partitions: u32,
}

impl HashPartitioning {
    /// Create new hash-based partitioning with given partition count
    pub fn new(num_partitions: u32) -> crate::Result<Self> {
        if num_partitions == 0 {
            return Err(crate::Error::Config(
                "num_partitions must be > 0".to_string(),
            ));
        }
        Ok(Self { num_partitions })
    }

    /// Total number of partitions
    pub fn num_partitions(&self) -> u32 {
        self.num_partitions
    }

    /// Compute partition number for a key
    pub fn partition(&self, key: &[u8]) -> u32 {
        let hash = blake3::hash(key);
        let hash_bytes = hash.as_bytes();
        let hash_u32 =
            u32::from_le_bytes([hash_bytes[0], hash_bytes[1], hash_bytes[2], hash_bytes[3]]);
        hash_u32 % self.num_partitions
    }

    /// Broker subject for a key on a topic: `<topic>.<partition>`
    pub fn subject(&self, topic: &str, key: &[u8]) -> String {
        format!("{}.{}", topic, self.partition(key))
    }

    /// Wildcard covering every partition of a topic
    pub fn wildcard(topic: &str) -> String {
        format!("{}.>", topic)
    }
}

impl Default for HashPartitioning {
    fn default() -> Self {
        Self { num_partitions: 16 }
    }
}
