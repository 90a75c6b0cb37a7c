//! Hash-linked records.
//!
//! A record's self-hash is SHA-256 over the canonical encoding
//! `index ++ timestamp ++ compact_json(payload) ++ previous_hash`.
//! The payload is serialized compactly with keys in insertion order
//! (serde_json `preserve_order`). Floats are parsed with `float_roundtrip`,
//! so a record read back from disk hashes to the same digest it was
//! written with.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Ordered payload mapping stored in each record.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Previous-hash of the genesis record
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Sentinel payload value of the genesis record
pub const GENESIS_MARKER: &str = "Genesis Block";

/// Compute the binding hash over a record's fields.
pub fn hash_link(index: u64, timestamp: &str, payload: &Payload, previous_hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index.to_string().as_bytes());
    hasher.update(timestamp.as_bytes());
    hasher.update(canonical_payload(payload).as_bytes());
    hasher.update(previous_hash.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compact, insertion-ordered JSON form of a payload.
pub fn canonical_payload(payload: &Payload) -> String {
    // Map<String, Value> serialization has no failure path
    serde_json::Value::Object(payload.clone()).to_string()
}

/// Capture-time timestamp: RFC 3339, UTC, microsecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// One immutable ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    index: u64,
    timestamp: String,
    #[serde(rename = "data")]
    payload: Payload,
    previous_hash: String,
    hash: String,
}

impl Record {
    /// Build a record and seal it with its self-hash.
    pub fn new(index: u64, timestamp: String, payload: Payload, previous_hash: String) -> Self {
        let hash = hash_link(index, &timestamp, &payload, &previous_hash);
        Self {
            index,
            timestamp,
            payload,
            previous_hash,
            hash,
        }
    }

    /// The fixed first record anchoring a chain.
    pub fn genesis() -> Self {
        let mut payload = Payload::new();
        payload.insert("data".to_string(), GENESIS_MARKER.into());
        Self::new(
            0,
            now_timestamp(),
            payload,
            GENESIS_PREVIOUS_HASH.to_string(),
        )
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    /// Digest the stored fields should hash to.
    pub fn expected_hash(&self) -> String {
        hash_link(
            self.index,
            &self.timestamp,
            &self.payload,
            &self.previous_hash,
        )
    }

    /// Whether the stored self-hash still binds the stored fields
    pub fn is_sealed(&self) -> bool {
        self.hash == self.expected_hash()
    }
}

/// Kind of chain integrity failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Position 0 is not a genesis record
    BadGenesis,
    /// Stored index differs from the record's position
    IndexGap,
    /// Stored self-hash differs from the recomputed one
    HashMismatch,
    /// previous_hash differs from the predecessor's self-hash
    BrokenLink,
}

/// First integrity failure found in a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainViolation {
    /// Position of the offending record
    pub index: usize,
    pub kind: ViolationKind,
}

impl fmt::Display for ChainViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            ViolationKind::BadGenesis => "genesis record is malformed",
            ViolationKind::IndexGap => "index does not match position",
            ViolationKind::HashMismatch => "stored hash does not match contents",
            ViolationKind::BrokenLink => "previous_hash does not match predecessor",
        };
        write!(f, "record {}: {}", self.index, what)
    }
}

impl std::error::Error for ChainViolation {}

/// Check every record's seal and linkage, stopping at the first failure.
pub fn verify_chain(chain: &[Record]) -> Result<(), ChainViolation> {
    for (position, record) in chain.iter().enumerate() {
        let violation = |kind| ChainViolation {
            index: position,
            kind,
        };

        if record.index != position as u64 {
            return Err(violation(ViolationKind::IndexGap));
        }

        if position == 0 {
            if record.previous_hash != GENESIS_PREVIOUS_HASH {
                return Err(violation(ViolationKind::BadGenesis));
            }
        } else if record.previous_hash != chain[position - 1].hash {
            return Err(violation(ViolationKind::BrokenLink));
        }

        if !record.is_sealed() {
            return Err(violation(ViolationKind::HashMismatch));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_hash_is_deterministic() {
        let p = payload(json!({"a": 1, "b": "two"}));
        let h1 = hash_link(3, "2024-01-01T00:00:00.000000Z", &p, "abc");
        let h2 = hash_link(3, "2024-01-01T00:00:00.000000Z", &p, "abc");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn test_hash_is_order_sensitive() {
        let ab = payload(json!({"a": 1, "b": 2}));
        let ba = payload(json!({"b": 2, "a": 1}));
        assert_ne!(
            hash_link(1, "t", &ab, "p"),
            hash_link(1, "t", &ba, "p")
        );
    }

    #[test]
    fn test_hash_binds_every_field() {
        let p = payload(json!({"a": 1}));
        let base = hash_link(1, "t", &p, "p");
        assert_ne!(base, hash_link(2, "t", &p, "p"));
        assert_ne!(base, hash_link(1, "u", &p, "p"));
        assert_ne!(base, hash_link(1, "t", &payload(json!({"a": 2})), "p"));
        assert_ne!(base, hash_link(1, "t", &p, "q"));
    }

    #[test]
    fn test_canonical_payload_is_compact() {
        let p = payload(json!({"z": [1, 2], "a": {"k": "v"}}));
        assert_eq!(canonical_payload(&p), r#"{"z":[1,2],"a":{"k":"v"}}"#);
    }

    #[test]
    fn test_genesis_shape() {
        let g = Record::genesis();
        assert_eq!(g.index(), 0);
        assert_eq!(g.previous_hash(), "0");
        assert_eq!(g.payload()["data"], "Genesis Block");
        assert!(g.is_sealed());
        assert!(g.timestamp().ends_with('Z'));
    }

    #[test]
    fn test_record_serializes_with_stable_field_order() {
        let r = Record::new(1, "t".to_string(), payload(json!({"a": 1})), "p".to_string());
        let text = serde_json::to_string(&r).unwrap();
        let index = text.find("\"index\"").unwrap();
        let timestamp = text.find("\"timestamp\"").unwrap();
        let data = text.find("\"data\"").unwrap();
        let previous = text.find("\"previous_hash\"").unwrap();
        let hash = text.find("\"hash\"").unwrap();
        assert!(index < timestamp && timestamp < data && data < previous && previous < hash);
    }

    #[test]
    fn test_verify_chain_reports_first_broken_link() {
        let g = Record::genesis();
        let r1 = Record::new(1, "t1".into(), payload(json!({"a": 1})), g.hash().to_string());
        let r2 = Record::new(2, "t2".into(), payload(json!({"a": 2})), "not-r1".into());
        let chain = vec![g, r1, r2];

        let err = verify_chain(&chain).unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.kind, ViolationKind::BrokenLink);
    }

    #[test]
    fn test_verify_chain_rejects_non_genesis_anchor() {
        let r = Record::new(0, "t".into(), payload(json!({"a": 1})), "deadbeef".into());
        let err = verify_chain(&[r]).unwrap_err();
        assert_eq!(err.kind, ViolationKind::BadGenesis);
    }
}
