//! Anthropic Messages API HTTP client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use civdrone_core::{ReasoningError, ReasoningService};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 2000;

const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert AI assistant for civilian drone operations. \
Provide clear, actionable advice for drone operations including filming, mustering, hunting, and other civilian uses. \
Be concise, practical, and safety-focused in your responses.";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Transport-level timeout; the advisor applies its own bound on top
    pub request_timeout: Duration,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClaudeConfig {
    /// Read `ANTHROPIC_API_KEY`, `ANTHROPIC_MODEL` and `ANTHROPIC_API_URL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| non_blank(lookup(key));
        Self {
            api_key: get("ANTHROPIC_API_KEY"),
            api_url: get("ANTHROPIC_API_URL").unwrap_or(defaults.api_url),
            model: get("ANTHROPIC_MODEL").unwrap_or(defaults.model),
            ..defaults
        }
    }
}

/// Reasoning service that forwards questions to Claude.
pub struct ClaudeClient {
    client: Client,
    config: ClaudeConfig,
    running: AtomicBool,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl ClaudeClient {
    pub fn new(config: ClaudeConfig) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        let running = config.api_key.is_some();
        if running {
            tracing::info!(model = %config.model, "Claude client initialized");
        } else {
            tracing::warn!("no Anthropic API key configured, AI advice disabled");
        }
        Ok(Self {
            client,
            config,
            running: AtomicBool::new(running),
        })
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClaudeConfig::from_env())
    }

    pub fn config(&self) -> &ClaudeConfig {
        &self.config
    }

    /// Stop accepting requests.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
        tracing::info!("Claude client shut down");
    }

    async fn send(
        &self,
        question: &str,
        context: &Value,
        system_prompt: Option<&str>,
    ) -> Result<String, ReasoningError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ReasoningError::ServiceUnavailable)?;
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system: system_prompt.unwrap_or(DEFAULT_SYSTEM_PROMPT),
            messages: [Message {
                role: "user",
                content: user_message(question, context),
            }],
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %text, "Claude API request failed");
            return Err(ReasoningError::Transport(format!(
                "API request failed with status {}",
                status.as_u16()
            )));
        }

        let payload: MessagesResponse = response.json().await.map_err(|err| {
            tracing::error!(error = %err, "unexpected response format from Claude API");
            ReasoningError::MalformedResponse(err.to_string())
        })?;
        extract_text(payload)
    }

    fn transport_error(&self, err: reqwest::Error) -> ReasoningError {
        if err.is_timeout() {
            tracing::error!("timeout waiting for Claude API response");
            ReasoningError::Timeout(self.config.request_timeout)
        } else {
            tracing::error!(error = %err, "error calling Claude API");
            ReasoningError::Transport(err.to_string())
        }
    }
}

impl ReasoningService for ClaudeClient {
    fn is_ready(&self) -> bool {
        self.config.api_key.is_some() && self.running.load(Ordering::Relaxed)
    }

    async fn generate_advice(
        &self,
        question: &str,
        context: &Value,
        system_prompt: Option<&str>,
    ) -> Result<String, ReasoningError> {
        if !self.is_ready() {
            return Err(ReasoningError::ServiceUnavailable);
        }
        self.send(question, context, system_prompt).await
    }
}

fn user_message(question: &str, context: &Value) -> String {
    let context = serde_json::to_string_pretty(context).unwrap_or_else(|_| context.to_string());
    format!("{question}\n\nContext: {context}")
}

fn extract_text(payload: MessagesResponse) -> Result<String, ReasoningError> {
    payload
        .content
        .into_iter()
        .next()
        .and_then(|block| block.text)
        .ok_or_else(|| ReasoningError::MalformedResponse("response has no text content".to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
