//! Confidence scoring for logged replies.
//!
//! Replies may end with an explicit assessment block:
//!
//! ```text
//! GenAI Confidence Assessment:
//! Reliability: 0.9
//! Performance: 0.8
//! Context Coherence: 0.7
//! ```
//!
//! When the block is missing or unparseable the scorer falls back to a
//! word-count heuristic. The fallback is never reported as a failure.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::record::Payload;

/// Reliability ceiling of the heuristic estimate
pub const MAX_ESTIMATED_RELIABILITY: f64 = 0.95;

/// Words needed for full heuristic reliability
pub const WORDS_PER_RELIABILITY: f64 = 1000.0;

/// Fixed heuristic performance score
pub const ESTIMATED_PERFORMANCE: f64 = 0.8;

/// Base heuristic coherence score
pub const BASE_CONTEXT_COHERENCE: f64 = 0.7;

/// Coherence boost when the reply mentions "context"
pub const CONTEXT_COHERENCE_BOOST: f64 = 0.2;

const FLOAT: &str = r"([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)";

static ASSESSMENT_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?is)reliability:\s*{f}.*?performance:\s*{f}.*?context\s+coherence:\s*{f}",
        f = FLOAT
    );
    Regex::new(&pattern).expect("assessment pattern is valid")
});

/// Three-component confidence assessment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationScores {
    pub reliability: f64,
    pub performance: f64,
    pub context_coherence: f64,
}

impl EvaluationScores {
    pub fn new(reliability: f64, performance: f64, context_coherence: f64) -> Self {
        Self {
            reliability,
            performance,
            context_coherence,
        }
    }

    /// Arithmetic mean of the three components
    pub fn overall(&self) -> f64 {
        (self.reliability + self.performance + self.context_coherence) / 3.0
    }

    pub fn is_in_range(&self) -> bool {
        [self.reliability, self.performance, self.context_coherence]
            .iter()
            .all(|s| (0.0..=1.0).contains(s))
    }

    pub fn clamped(&self) -> Self {
        Self::new(
            self.reliability.clamp(0.0, 1.0),
            self.performance.clamp(0.0, 1.0),
            self.context_coherence.clamp(0.0, 1.0),
        )
    }

    /// Payload form, including the derived overall confidence.
    pub fn to_payload(&self) -> Payload {
        let mut map = Payload::new();
        map.insert("reliability".into(), json!(self.reliability));
        map.insert("performance".into(), json!(self.performance));
        map.insert("context_coherence".into(), json!(self.context_coherence));
        map.insert("overall_confidence".into(), json!(self.overall()));
        map
    }
}

/// Mean of the three components.
pub fn overall(scores: &EvaluationScores) -> f64 {
    scores.overall()
}

fn parse_score(m: Option<regex::Match<'_>>) -> Option<f64> {
    m?.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an explicit assessment block, if present.
/// Values that overflow to infinity count as no block.
pub fn parse_explicit(text: &str) -> Option<EvaluationScores> {
    let caps = ASSESSMENT_RE.captures(text)?;
    let r = parse_score(caps.get(1))?;
    let p = parse_score(caps.get(2))?;
    let c = parse_score(caps.get(3))?;
    Some(EvaluationScores::new(r, p, c))
}

/// Heuristic estimate from the reply text alone.
pub fn estimate(text: &str) -> EvaluationScores {
    let words = text.split_whitespace().count() as f64;
    let reliability = (words / WORDS_PER_RELIABILITY).min(MAX_ESTIMATED_RELIABILITY);
    let context_coherence = if text.to_lowercase().contains("context") {
        BASE_CONTEXT_COHERENCE + CONTEXT_COHERENCE_BOOST
    } else {
        BASE_CONTEXT_COHERENCE
    };
    EvaluationScores::new(reliability, ESTIMATED_PERFORMANCE, context_coherence)
}

/// Explicit scores when the text carries them, otherwise the estimate.
/// Explicit values are passed through unclamped.
pub fn extract(text: &str) -> EvaluationScores {
    parse_explicit(text).unwrap_or_else(|| estimate(text))
}

/// What to do with explicit scores outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRangePolicy {
    /// Keep the values as given
    #[default]
    PassThrough,
    /// Clamp each component into [0, 1]
    Clamp,
    /// Discard the explicit block and use the estimate
    Reject,
}

/// Pluggable confidence scorer.
///
/// `assessment_block` is the tail of the reply starting at the assessment
/// marker, when the reply has one. `full_text` is the whole raw reply.
pub trait ConfidenceScorer: Send + Sync {
    fn assess(&self, assessment_block: Option<&str>, full_text: &str) -> EvaluationScores;
}

/// Default scorer: explicit block, falling back to the word-count estimate
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    policy: OutOfRangePolicy,
}

impl HeuristicScorer {
    pub fn new(policy: OutOfRangePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> OutOfRangePolicy {
        self.policy
    }
}

impl ConfidenceScorer for HeuristicScorer {
    fn assess(&self, assessment_block: Option<&str>, full_text: &str) -> EvaluationScores {
        let explicit = parse_explicit(assessment_block.unwrap_or(full_text));

        let accepted = match (explicit, self.policy) {
            (Some(scores), _) if scores.is_in_range() => Some(scores),
            (Some(scores), OutOfRangePolicy::PassThrough) => {
                tracing::debug!(?scores, "explicit scores outside [0, 1], passing through");
                Some(scores)
            }
            (Some(scores), OutOfRangePolicy::Clamp) => Some(scores.clamped()),
            (Some(scores), OutOfRangePolicy::Reject) => {
                tracing::debug!(?scores, "explicit scores outside [0, 1], rejected");
                None
            }
            (None, _) => None,
        };

        accepted.unwrap_or_else(|| {
            tracing::debug!("no usable assessment block, estimating confidence");
            estimate(full_text)
        })
    }
}

// =============================================================================
// Criteria-based evaluation
// =============================================================================

/// Criteria every [`EvaluationCriteria`] carries, in display order
pub const CRITERIA_NAMES: [&str; 4] = [
    "Grammatically Complete",
    "Logically Consistent",
    "AI Inquiry",
    "Content Language",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CriteriaError {
    #[error("Invalid criterion: {0}")]
    UnknownCriterion(String),
}

/// Verdict for one named criterion
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Criterion {
    pub reason: String,
    pub confidence: f64,
    pub boolean: bool,
}

/// Fixed set of four named criteria
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationCriteria {
    criteria: Vec<(String, Criterion)>,
}

impl Default for EvaluationCriteria {
    fn default() -> Self {
        Self {
            criteria: CRITERIA_NAMES
                .iter()
                .map(|name| (name.to_string(), Criterion::default()))
                .collect(),
        }
    }
}

impl EvaluationCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_criterion(
        &mut self,
        name: &str,
        reason: &str,
        confidence: f64,
        boolean: bool,
    ) -> Result<(), CriteriaError> {
        let slot = self
            .criteria
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or_else(|| CriteriaError::UnknownCriterion(name.to_string()))?;
        slot.1 = Criterion {
            reason: reason.to_string(),
            confidence,
            boolean,
        };
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Mean confidence across all criteria
    pub fn overall(&self) -> f64 {
        let total: f64 = self.criteria.iter().map(|(_, c)| c.confidence).sum();
        total / self.criteria.len() as f64
    }

    pub fn to_payload(&self) -> Payload {
        let mut criteria = Payload::new();
        for (name, c) in &self.criteria {
            criteria.insert(
                name.clone(),
                json!({
                    "reason": c.reason,
                    "confidence": c.confidence,
                    "boolean": c.boolean,
                }),
            );
        }
        let mut map = Payload::new();
        map.insert("criteria".into(), serde_json::Value::Object(criteria));
        map.insert("overall_confidence".into(), json!(self.overall()));
        map
    }
}

/// Evaluation attached to a logged response
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreSet {
    Simple(EvaluationScores),
    Criteria(EvaluationCriteria),
}

impl ScoreSet {
    pub fn overall(&self) -> f64 {
        match self {
            ScoreSet::Simple(s) => s.overall(),
            ScoreSet::Criteria(c) => c.overall(),
        }
    }

    pub fn to_payload(&self) -> Payload {
        match self {
            ScoreSet::Simple(s) => s.to_payload(),
            ScoreSet::Criteria(c) => c.to_payload(),
        }
    }
}

impl From<EvaluationScores> for ScoreSet {
    fn from(scores: EvaluationScores) -> Self {
        ScoreSet::Simple(scores)
    }
}

impl From<EvaluationCriteria> for ScoreSet {
    fn from(criteria: EvaluationCriteria) -> Self {
        ScoreSet::Criteria(criteria)
    }
}
