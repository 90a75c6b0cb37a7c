//! Hopper Common - hash-linked conversation journal
//!
//! Records assistant replies into an append-only, SHA-256 linked ledger,
//! scores each reply's confidence, and searches what has been logged.

pub mod config;
pub mod error;
pub mod ledger;
pub mod llm_client;
pub mod prompts;
pub mod query;
pub mod record;
pub mod recorder;
pub mod response;
pub mod scoring;

pub use config::HopperConfig;
pub use error::LedgerError;
pub use ledger::{Ledger, SharedLedger};
pub use llm_client::{GenerationError, HttpGenerator, ScriptedGenerator, TextGenerator};
pub use query::{search, search_records};
pub use record::{hash_link, ChainViolation, Payload, Record, ViolationKind};
pub use recorder::{ConversationRecorder, LoggedReply, RecordOutcome};
pub use response::{ResponseContent, ResponseEntry};
pub use scoring::{
    ConfidenceScorer, EvaluationCriteria, EvaluationScores, HeuristicScorer, OutOfRangePolicy,
    ScoreSet,
};
