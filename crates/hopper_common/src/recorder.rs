//! Turns assistant replies into ledger records.

use regex::Regex;
use once_cell::sync::Lazy;
use tracing::info;

use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::response::{ResponseContent, ResponseEntry};
use crate::scoring::{ConfidenceScorer, EvaluationScores, HeuristicScorer};

/// Token a reply carries when the assistant ends the session
pub const EXIT_MARKER: &str = "EXIT";

/// Label that opens the confidence block of a reply
pub const ASSESSMENT_MARKER: &str = "GenAI Confidence Assessment:";

/// Characters of content kept in the running context preview
pub const PREVIEW_CHARS: usize = 100;

static ASSESSMENT_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("(?i){}", regex::escape(ASSESSMENT_MARKER)))
        .expect("marker pattern is valid")
});

/// A reply that made it into the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedReply {
    pub index: u64,
    pub hash: String,
    pub scores: EvaluationScores,
    /// Human-readable confirmation line
    pub summary: String,
    /// Running context after this reply
    pub context: String,
}

/// Result of recording one reply
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// The reply signalled the end of the session; nothing was appended
    Exit,
    Logged(LoggedReply),
}

impl RecordOutcome {
    pub fn is_exit(&self) -> bool {
        matches!(self, RecordOutcome::Exit)
    }
}

/// Split a reply into trimmed content and the assessment tail (marker onward).
pub fn split_reply(raw_text: &str) -> (&str, Option<&str>) {
    match ASSESSMENT_MARKER_RE.find(raw_text) {
        Some(m) => (raw_text[..m.start()].trim(), Some(&raw_text[m.start()..])),
        None => (raw_text.trim(), None),
    }
}

/// Replace literal newlines with the two characters `\n`.
pub fn escape_newlines(content: &str) -> String {
    content.replace('\n', "\\n")
}

fn preview(content: &str) -> String {
    content.chars().take(PREVIEW_CHARS).collect()
}

/// Records replies into a ledger and keeps the running conversation context
pub struct ConversationRecorder {
    ledger: Ledger,
    scorer: Box<dyn ConfidenceScorer>,
    context: String,
}

impl ConversationRecorder {
    pub fn new(ledger: Ledger, scorer: Box<dyn ConfidenceScorer>) -> Self {
        Self {
            ledger,
            scorer,
            context: String::new(),
        }
    }

    /// Recorder with the default heuristic scorer
    pub fn with_default_scorer(ledger: Ledger) -> Self {
        Self::new(ledger, Box::new(HeuristicScorer::default()))
    }

    /// Score and append one raw reply.
    pub fn record(
        &mut self,
        response_type: &str,
        raw_text: &str,
    ) -> Result<RecordOutcome, LedgerError> {
        if raw_text.contains(EXIT_MARKER) {
            info!("exit marker received, nothing recorded");
            return Ok(RecordOutcome::Exit);
        }

        let (content, assessment) = split_reply(raw_text);
        let scores = self.scorer.assess(assessment, raw_text);

        let entry = ResponseEntry::new(
            ResponseContent::Text {
                response_type: response_type.to_string(),
                text: escape_newlines(content),
            },
            scores,
        );
        let record = self.ledger.append_response(&entry)?;
        let (index, hash) = (record.index(), record.hash().to_string());

        self.context
            .push_str(&format!("\nAdded response: {}...", preview(content)));

        Ok(RecordOutcome::Logged(LoggedReply {
            index,
            hash,
            scores,
            summary: format!(
                "Response added to the blockchain. Overall confidence: {:.2}",
                scores.overall()
            ),
            context: self.context.clone(),
        }))
    }

    /// Append a structured response (summary, translation, sentiment).
    pub fn record_entry(&mut self, entry: &ResponseEntry) -> Result<u64, LedgerError> {
        let record = self.ledger.append_response(entry)?;
        Ok(record.index())
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }
}
