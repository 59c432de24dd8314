//! Outbound message for keyed pub/sub

use bytes::Bytes;
use serde::Serialize;

/// Header carrying the raw partition key (NATS has no native message key)
pub const MESSAGE_KEY_HEADER: &str = "message-key";

/// Message handed to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Logical topic (subject prefix)
    pub topic: String,

    /// Partition/ordering key
    pub key: String,

    /// Headers (metadata), in insertion order
    pub headers: Vec<(String, String)>,

    /// Encoded value
    pub payload: Bytes,
}

impl OutboundMessage {
    /// Create new message from an already-encoded payload
    pub fn new(topic: impl Into<String>, key: impl Into<String>, payload: Bytes) -> Self {
        Self {
            topic: topic.into(),
            key: key.into(),
            headers: Vec::new(),
            payload,
        }
    }

    /// Create new message with a JSON-encoded value
    pub fn json<T: Serialize>(
        topic: impl Into<String>,
        key: impl Into<String>,
        value: &T,
    ) -> crate::Result<Self> {
        let payload = serde_json::to_vec(value)?;
        Ok(Self::new(topic, key, Bytes::from(payload)))
    }

    /// Add header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Header value by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every header as it goes on the wire, `message-key` first
    pub fn wire_headers(&self) -> impl Iterator<Item = (&str, &str)> {
        std::iter::once((MESSAGE_KEY_HEADER, self.key.as_str()))
            .chain(self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Reject header names or values that would break the header block.
    ///
    /// Header lines are written verbatim, so CR/LF in a value would start a
    /// new header.
    pub fn validate_headers(&self) -> crate::Result<()> {
        for (name, value) in self.wire_headers() {
            if name.is_empty() || name.chars().any(|c| c.is_control() || c == ':' || c == ' ') {
                return Err(crate::Error::InvalidHeader(format!("name {:?}", name)));
            }
            if value.chars().any(char::is_control) {
                return Err(crate::Error::InvalidHeader(format!(
                    "value of {} contains control characters",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Key as UTF-8 bytes
    pub fn key_bytes(&self) -> &[u8] {
        self.key.as_bytes()
    }
}
