//! Core types for the ledger
//!
//! Wire names follow the public HTTP contract: `transaction_id` for the id
//! and `type` for the classification tag. `amount` and an explicit
//! `timestamp` are carried through exactly as the caller wrote them.

use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Signed amount kept as the original JSON number literal.
///
/// Never rounded or range-limited beyond what a JSON number can express.
#[derive(Debug, Clone)]
pub struct Amount(Box<RawValue>);

impl Amount {
    /// Parse a JSON number literal
    pub fn parse(literal: &str) -> Result<Self> {
        let raw = RawValue::from_string(literal.trim().to_string())?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: Box<RawValue>) -> Result<Self> {
        serde_json::from_str::<serde_json::Number>(raw.get()).map_err(|_| {
            Error::Validation(format!("amount must be a JSON number, got {}", raw.get()))
        })?;
        Ok(Self(raw))
    }

    /// Literal as submitted
    pub fn as_str(&self) -> &str {
        self.0.get()
    }
}

impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Amount {}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Self::from_raw(raw).map_err(de::Error::custom)
    }
}

/// RFC 3339 timestamp that keeps its original text next to the parsed instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    raw: String,
    instant: DateTime<Utc>,
}

impl Timestamp {
    /// Parse RFC 3339 text; any offset is accepted and kept as written
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let instant = DateTime::parse_from_rfc3339(&raw)
            .map_err(|e| Error::Validation(format!("invalid timestamp {:?}: {}", raw, e)))?
            .with_timezone(&Utc);
        Ok(Self { raw, instant })
    }

    /// The instant in UTC
    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// Text as submitted (or as rendered when assigned by the ledger)
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self {
            raw: instant.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            instant,
        }
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw).map_err(de::Error::custom)
    }
}

/// Authoritative transaction record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Opaque unique identifier
    #[serde(rename = "transaction_id")]
    pub id: String,

    /// Owner of the transaction
    pub user_id: i64,

    /// Signed amount, passed through without rounding
    pub amount: Amount,

    /// ISO-4217-like currency code (not validated)
    pub currency: String,

    /// Classification tag (credit, debit, ...)
    #[serde(rename = "type")]
    pub kind: String,

    /// Free-form metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// Creation instant
    pub timestamp: Timestamp,
}

/// Transaction as submitted by a caller, before the ledger fills in defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Caller-supplied id; generated when absent or empty
    #[serde(rename = "transaction_id", default)]
    pub id: Option<String>,

    /// Owner of the transaction
    pub user_id: i64,

    /// Signed amount
    pub amount: Amount,

    /// Currency code
    pub currency: String,

    /// Classification tag
    #[serde(rename = "type")]
    pub kind: String,

    /// Metadata; `null` and absent both mean "none"
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,

    /// Explicit creation instant; assigned at ingestion when absent
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

impl NewTransaction {
    /// Decode and validate a submission from raw JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let submission: Self = serde_json::from_slice(bytes)?;
        submission.validate()?;
        Ok(submission)
    }

    /// Reject ids that cannot travel as a message key.
    ///
    /// The id ends up in a broker header line, so control characters
    /// (CR/LF in particular) are refused.
    pub fn validate(&self) -> Result<()> {
        if let Some(id) = &self.id {
            if id.chars().any(char::is_control) {
                return Err(Error::Validation(
                    "transaction_id must not contain control characters".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Materialize the record, assigning an id and `now` where missing.
    ///
    /// An explicit timestamp is kept as submitted.
    pub fn into_transaction(self, now: DateTime<Utc>) -> Transaction {
        let id = match self.id {
            Some(id) if !id.is_empty() => id,
            _ => Uuid::now_v7().to_string(),
        };

        Transaction {
            id,
            user_id: self.user_id,
            amount: self.amount,
            currency: self.currency,
            kind: self.kind,
            metadata: self.metadata.unwrap_or_default(),
            timestamp: self.timestamp.unwrap_or_else(|| Timestamp::from(now)),
        }
    }
}

/// Fixture records used to pre-populate a demo store
pub fn demo_transactions() -> Vec<Transaction> {
    [
        (
            "b35d8def-0025-440f-9d0e-b0aab008a093",
            1009,
            "42.38",
            "KES",
            "credit",
            "Shopify",
            "2025-08-27T15:42:57.289182Z",
        ),
        (
            "9b2c85f0-7641-45f0-bf21-219a93c20f5f",
            1012,
            "120.50",
            "USD",
            "debit",
            "Amazon",
            "2025-08-27T16:10:11.582739Z",
        ),
        (
            "f67291b1-41df-4d32-8b87-7c7f2f4d1d88",
            1003,
            "15.75",
            "EUR",
            "credit",
            "Netflix",
            "2025-08-27T17:22:33.192847Z",
        ),
    ]
    .into_iter()
    .filter_map(|(id, user_id, amount, currency, kind, merchant, ts)| {
        Some(Transaction {
            id: id.to_string(),
            user_id,
            amount: amount.parse().ok()?,
            currency: currency.to_string(),
            kind: kind.to_string(),
            metadata: BTreeMap::from([("merchant".to_string(), merchant.to_string())]),
            timestamp: ts.parse().ok()?,
        })
    })
    .collect()
}
