//! Text generation backends.
//!
//! The chat loop only needs `generate(prompt, context) -> reply`. The HTTP
//! client speaks the Ollama `/api/generate` API and falls back to an
//! OpenAI-compatible `/v1/chat/completions` endpoint.

use anyhow::Result;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::prompts;

/// Generation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("LLM is disabled in configuration")]
    Disabled,

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("LLM returned empty response")]
    EmptyResponse,
}

/// Synchronous text generation collaborator
pub trait TextGenerator: Send + Sync {
    /// Produce a reply to `prompt` given the running conversation `context`.
    fn generate(&self, prompt: &str, context: &str) -> Result<String, GenerationError>;
}

/// Real generator using HTTP
pub struct HttpGenerator {
    config: LlmConfig,
    client: reqwest::blocking::Client,
}

impl HttpGenerator {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { config, client })
    }

    /// Check if endpoint is Ollama-style
    fn is_ollama_endpoint(&self) -> bool {
        self.config.endpoint.contains("11434") || self.config.endpoint.contains("ollama")
    }

    fn send_error(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout(self.config.timeout_secs)
        } else {
            GenerationError::HttpError(format!("Request failed: {}", e))
        }
    }

    /// Call Ollama-style API
    fn call_ollama(&self, system_prompt: &str, user_prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/api/generate", self.config.endpoint.trim_end_matches('/'));

        let request_body = serde_json::json!({
            "model": self.config.model,
            "system": system_prompt,
            "prompt": user_prompt,
            "stream": false,
        });

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .map_err(|e| self.send_error(e))?;

        if !response.status().is_success() {
            return Err(GenerationError::HttpError(format!(
                "HTTP {} from Ollama",
                response.status()
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .map_err(|e| GenerationError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        response_json
            .get("response")
            .and_then(|v| v.as_str())
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
            .ok_or(GenerationError::EmptyResponse)
    }

    /// Call OpenAI-compatible API
    fn call_openai_compatible(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, GenerationError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );

        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
        });

        let mut request = self.client.post(&url).json(&request_body);

        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().map_err(|e| self.send_error(e))?;

        if !response.status().is_success() {
            return Err(GenerationError::HttpError(format!(
                "HTTP {} from OpenAI-compatible API",
                response.status()
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .map_err(|e| GenerationError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        response_json
            .get("choices")
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("message"))
            .and_then(|v| v.get("content"))
            .and_then(|v| v.as_str())
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
            .ok_or(GenerationError::EmptyResponse)
    }
}

impl TextGenerator for HttpGenerator {
    fn generate(&self, prompt: &str, context: &str) -> Result<String, GenerationError> {
        if !self.config.enabled {
            return Err(GenerationError::Disabled);
        }

        let user_prompt = prompts::build_user_prompt(context, prompt);

        if self.is_ollama_endpoint() {
            match self.call_ollama(&prompts::SYSTEM_PROMPT, &user_prompt) {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::debug!("Ollama API failed, trying OpenAI-compatible: {}", e);
                }
            }
        }

        self.call_openai_compatible(&prompts::SYSTEM_PROMPT, &user_prompt)
    }
}

/// Generator replaying canned replies, for tests and offline runs
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Replies that all succeed
    pub fn from_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(|r| Ok(r.into())).collect())
    }

    /// `(prompt, context)` pairs seen so far
    pub fn calls(&self) -> Vec<(String, String)> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, prompt: &str, context: &str) -> Result<String, GenerationError> {
        if let Ok(mut seen) = self.prompts.lock() {
            seen.push((prompt.to_string(), context.to_string()));
        }

        self.replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .unwrap_or(Err(GenerationError::EmptyResponse))
    }
}
