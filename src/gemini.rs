//! Minimal Gemini client for exam generation.
//!
//! One call shape only: `models/{model}:generateContent` with a single user text
//! part, returning the concatenated text of the first candidate.
//! Calls are instrumented and log model name, latency, token usage and response
//! size (not contents).
//!
//! NOTE: We never log the API key or the prompt text.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Model used for all exam generation. Fixed, not configurable.
pub const MODEL: &str = "gemini-2.5-pro";

#[derive(Debug, Error)]
pub enum ModelError {
  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("API error (status {status}): {message}")]
  Api { status: u16, message: String },

  #[error("unexpected response envelope: {0}")]
  Envelope(String),

  #[error("model returned no text (reason: {reason})")]
  EmptyContent { reason: String },
}

/// Anything that turns one prompt into one raw text completion.
/// The generator depends on this seam, not on a concrete vendor client.
#[async_trait]
pub trait TextModel: Send + Sync {
  async fn generate_text(&self, prompt: &str) -> Result<String, ModelError>;

  /// Model identifier for logs.
  fn model_name(&self) -> &str;
}

#[derive(Clone)]
pub struct Gemini {
  client: reqwest::Client,
  api_key: String,
  base_url: String,
  model: String,
}

impl Gemini {
  /// Build the client once at startup. `timeout` bounds the whole HTTP exchange.
  pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Result<Self, ModelError> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()?;
    Ok(Self {
      client,
      api_key: api_key.into(),
      base_url: base_url.into(),
      model: MODEL.to_string(),
    })
  }

  pub fn base_url(&self) -> &str { &self.base_url }

  fn endpoint(&self) -> String {
    format!("{}/models/{}:generateContent", self.base_url, self.model)
  }
}

#[async_trait]
impl TextModel for Gemini {
  #[instrument(level = "info", skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
  async fn generate_text(&self, prompt: &str) -> Result<String, ModelError> {
    let req = GenerateContentRequest {
      contents: vec![ContentReq {
        role: "user",
        parts: vec![PartReq { text: prompt }],
      }],
    };

    let start = Instant::now();
    let res = self.client.post(self.endpoint())
      .header(USER_AGENT, concat!("mts-exam-generator/", env!("CARGO_PKG_VERSION")))
      .header(CONTENT_TYPE, "application/json")
      .header("x-goog-api-key", &self.api_key)
      .json(&req).send().await?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      let message = extract_gemini_error(&body).unwrap_or(body);
      return Err(ModelError::Api { status: status.as_u16(), message });
    }

    let body = res.text().await?;
    let parsed: GenerateContentResponse = serde_json::from_str(&body)
      .map_err(|e| ModelError::Envelope(e.to_string()))?;

    if let Some(usage) = &parsed.usage_metadata {
      info!(
        prompt_tokens = ?usage.prompt_token_count,
        candidates_tokens = ?usage.candidates_token_count,
        total_tokens = ?usage.total_token_count,
        "Gemini usage"
      );
    }

    let text = candidate_text(parsed)?;
    info!(elapsed = ?start.elapsed(), response_len = text.len(), "Gemini response received");
    Ok(text)
  }

  fn model_name(&self) -> &str { &self.model }
}

/// Concatenate the non-thought text parts of the first candidate.
fn candidate_text(resp: GenerateContentResponse) -> Result<String, ModelError> {
  let block_reason = resp.prompt_feedback.and_then(|f| f.block_reason);
  let Some(candidate) = resp.candidates.into_iter().next() else {
    return Err(ModelError::EmptyContent {
      reason: block_reason.unwrap_or_else(|| "no candidates".into()),
    });
  };

  let text: String = candidate
    .content
    .map(|c| c.parts)
    .unwrap_or_default()
    .into_iter()
    .filter(|p| !p.thought.unwrap_or(false))
    .filter_map(|p| p.text)
    .collect();

  if text.trim().is_empty() {
    let reason = candidate.finish_reason.or(block_reason).unwrap_or_else(|| "empty text".into());
    debug!(%reason, "Gemini candidate had no text");
    return Err(ModelError::EmptyContent { reason });
  }
  Ok(text)
}

// --- Gemini DTOs ---

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
  contents: Vec<ContentReq<'a>>,
}
#[derive(Serialize)]
struct ContentReq<'a> { role: &'a str, parts: Vec<PartReq<'a>> }
#[derive(Serialize)]
struct PartReq<'a> { text: &'a str }

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
  #[serde(default)] candidates: Vec<Candidate>,
  #[serde(default)] usage_metadata: Option<UsageMetadata>,
  #[serde(default)] prompt_feedback: Option<PromptFeedback>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
  #[serde(default)] content: Option<ContentResp>,
  #[serde(default)] finish_reason: Option<String>,
}
#[derive(Deserialize)]
struct ContentResp { #[serde(default)] parts: Vec<PartResp> }
#[derive(Deserialize)]
struct PartResp {
  #[serde(default)] text: Option<String>,
  #[serde(default)] thought: Option<bool>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  #[serde(default)] prompt_token_count: Option<u32>,
  #[serde(default)] candidates_token_count: Option<u32>,
  #[serde(default)] total_token_count: Option<u32>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback { #[serde(default)] block_reason: Option<String> }

/// Try to extract a clean error message from a Gemini error body.
fn extract_gemini_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
