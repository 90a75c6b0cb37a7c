//! Error types for the Hopper ledger.

use std::path::PathBuf;
use thiserror::Error;

use crate::record::ChainViolation;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// Persisted chain is malformed or fails verification. Never repaired.
    #[error("Corrupt ledger at {path}: {reason}")]
    CorruptStorage { path: PathBuf, reason: String },

    /// Reading or durably writing the ledger file failed.
    #[error("Ledger I/O failed at {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl LedgerError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LedgerError::CorruptStorage {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn broken_chain(path: impl Into<PathBuf>, violation: &ChainViolation) -> Self {
        Self::corrupt(path, violation.to_string())
    }

    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LedgerError::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Process exit code used by hopperctl
    pub fn exit_code(&self) -> i32 {
        match self {
            LedgerError::CorruptStorage { .. } => 3,
            LedgerError::Persistence { .. } => 4,
            LedgerError::Encode(_) => 5,
        }
    }
}
