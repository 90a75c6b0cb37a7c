//! Response shapes that get logged into the ledger.

use serde_json::{json, Value};

use crate::record::Payload;
use crate::scoring::ScoreSet;

/// Response type of replies captured from the chat loop
pub const CONVERSATION: &str = "Conversation";

/// Closed set of logged response shapes, keyed by `response_type`
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseContent {
    /// Free-form reply text under a caller-chosen type name
    Text { response_type: String, text: String },
    Summary {
        summary: String,
        key_points: Option<Vec<String>>,
    },
    Translation {
        translated_text: String,
        source_language: String,
        target_language: String,
    },
    Sentiment {
        sentiment: String,
        score: f64,
        explanation: String,
    },
}

impl ResponseContent {
    pub fn conversation(text: impl Into<String>) -> Self {
        ResponseContent::Text {
            response_type: CONVERSATION.to_string(),
            text: text.into(),
        }
    }

    pub fn response_type(&self) -> &str {
        match self {
            ResponseContent::Text { response_type, .. } => response_type,
            ResponseContent::Summary { .. } => "Summary",
            ResponseContent::Translation { .. } => "Translation",
            ResponseContent::Sentiment { .. } => "Sentiment",
        }
    }

    fn content_value(&self) -> Value {
        match self {
            ResponseContent::Text { text, .. } => Value::String(text.clone()),
            ResponseContent::Summary {
                summary,
                key_points,
            } => json!({ "summary": summary, "key_points": key_points }),
            ResponseContent::Translation {
                translated_text,
                source_language,
                target_language,
            } => json!({
                "translated_text": translated_text,
                "source_language": source_language,
                "target_language": target_language,
            }),
            ResponseContent::Sentiment {
                sentiment,
                score,
                explanation,
            } => json!({
                "sentiment": sentiment,
                "score": score,
                "explanation": explanation,
            }),
        }
    }
}

/// A response together with its evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEntry {
    pub content: ResponseContent,
    pub evaluation: ScoreSet,
}

impl ResponseEntry {
    pub fn new(content: ResponseContent, evaluation: impl Into<ScoreSet>) -> Self {
        Self {
            content,
            evaluation: evaluation.into(),
        }
    }

    /// Ledger payload: `{response_type, content, evaluation}` in that order.
    pub fn to_payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert(
            "response_type".into(),
            Value::String(self.content.response_type().to_string()),
        );
        payload.insert("content".into(), self.content.content_value());
        payload.insert(
            "evaluation".into(),
            Value::Object(self.evaluation.to_payload()),
        );
        payload
    }
}

/// `response_type` of a logged payload, if it has one.
pub fn payload_response_type(payload: &Payload) -> Option<&str> {
    payload.get("response_type").and_then(Value::as_str)
}

/// `evaluation.overall_confidence` of a logged payload, if it has one.
pub fn payload_overall_confidence(payload: &Payload) -> Option<f64> {
    payload
        .get("evaluation")
        .and_then(|e| e.get("overall_confidence"))
        .and_then(Value::as_f64)
}
