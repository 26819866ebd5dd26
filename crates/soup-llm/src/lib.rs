//! OpenAI-compatible chat-completions client for the game host.
//!
//! Speaks the `/chat/completions` dialect shared by OpenAI, OpenRouter and
//! most self-hosted gateways, and implements [`ChatModel`] on top of it.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use soup_core::{
  model::{ChatModel, ProviderError},
  prompt::ChatMessage,
};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash-lite";

/// Longest slice of an error body kept in a [`ProviderError`].
const MAX_ERROR_BODY: usize = 300;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Client(#[from] reqwest::Error),
}

/// Connection settings for the provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
  pub base_url: String,
  pub api_key:  String,
  pub model:    String,
  pub timeout:  Duration,
}

impl Default for LlmConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_owned(),
      api_key:  String::new(),
      model:    DEFAULT_MODEL.to_owned(),
      timeout:  Duration::from_secs(120),
    }
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
  model:    &'a str,
  messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
  #[serde(default)]
  choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
  message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
  content: Option<String>,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Chat-completions client.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct OpenAiChat {
  client: Client,
  config: LlmConfig,
}

impl OpenAiChat {
  pub fn new(config: LlmConfig) -> Result<Self, Error> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &LlmConfig { &self.config }

  fn url(&self) -> String {
    format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
  }
}

fn truncate(body: &str) -> String { body.chars().take(MAX_ERROR_BODY).collect() }

/// Map a non-success HTTP status to a provider error.
fn classify(status: StatusCode, body: &str) -> ProviderError {
  let detail = format!("{status}: {}", truncate(body.trim()));
  match status {
    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Unauthorized(detail),
    _ => ProviderError::Other(detail),
  }
}

impl ChatModel for OpenAiChat {
  async fn generate(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
    if self.config.api_key.is_empty() {
      return Err(ProviderError::Unauthorized("no API key configured".into()));
    }

    let request = CompletionRequest { model: &self.config.model, messages };
    let resp = self
      .client
      .post(self.url())
      .bearer_auth(&self.config.api_key)
      .json(&request)
      .send()
      .await
      .map_err(|e| ProviderError::Other(format!("request failed: {e}")))?;

    let status = resp.status();
    let body = resp
      .text()
      .await
      .map_err(|e| ProviderError::Other(format!("reading response failed: {e}")))?;

    if !status.is_success() {
      tracing::debug!(%status, "chat completion rejected");
      return Err(classify(status, &body));
    }

    let parsed: CompletionResponse = serde_json::from_str(&body)
      .map_err(|e| ProviderError::Other(format!("invalid completion payload: {e}")))?;

    parsed
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .ok_or_else(|| ProviderError::Other("completion contained no message".into()))
  }
}
