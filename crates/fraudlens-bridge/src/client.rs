//! The [`SqlGenerator`] seam and its OpenAI-compatible implementation.

use std::{future::Future, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  error::Error,
  prompt::{SYSTEM_PROMPT, user_prompt},
};

/// Favour determinism over creativity.
const TEMPERATURE: f64 = 0.2;
const TOP_P: f64 = 0.9;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can turn a question into candidate SQL text.
///
/// The output is *candidate* text only — it has not passed the gate and
/// must go through [`validate`](crate::validate) before execution.
pub trait SqlGenerator: Send + Sync {
  fn generate_sql<'a>(
    &'a self,
    question: &'a str,
  ) -> impl Future<Output = Result<String>> + Send + 'a;
}

// ─── Configuration ───────────────────────────────────────────────────────────

/// Connection settings for the completion service.
#[derive(Debug, Clone)]
pub struct LlmConfig {
  /// Service root, e.g. `https://api.openai.com`.
  pub base_url: String,
  pub api_key:  String,
  pub model:    String,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct OpenAiClient {
  client: reqwest::Client,
  config: LlmConfig,
}

impl OpenAiClient {
  pub fn new(config: LlmConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!(
      "{}/v1/chat/completions",
      self.config.base_url.trim_end_matches('/')
    )
  }
}

impl SqlGenerator for OpenAiClient {
  async fn generate_sql(&self, question: &str) -> Result<String> {
    let request = ChatRequest {
      model:       &self.config.model,
      messages:    vec![
        Message { role: "system", content: SYSTEM_PROMPT.to_string() },
        Message { role: "user", content: user_prompt(question) },
      ],
      temperature: TEMPERATURE,
      top_p:       TOP_P,
    };

    tracing::debug!(model = %self.config.model, "requesting completion");
    let response = self
      .client
      .post(self.url())
      .bearer_auth(&self.config.api_key)
      .json(&request)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(Error::Completion(format!("{status}: {body}")));
    }

    let completion: ChatResponse = response
      .json()
      .await
      .map_err(|e| Error::Completion(format!("malformed response: {e}")))?;
    let choice = completion
      .choices
      .into_iter()
      .next()
      .ok_or_else(|| Error::Completion("no choices returned".to_string()))?;

    Ok(strip_fences(&choice.message.content).to_string())
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
  model:       &'a str,
  messages:    Vec<Message>,
  temperature: f64,
  top_p:       f64,
}

#[derive(Serialize)]
struct Message {
  role:    &'static str,
  content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
  content: String,
}

// ─── Completion cleanup ──────────────────────────────────────────────────────

/// Trim surrounding whitespace and any markdown code fence the model
/// wrapped its answer in.
fn strip_fences(s: &str) -> &str {
  let s = s.trim();
  let Some(inner) = s.strip_prefix("```") else {
    return s;
  };
  let inner = inner.strip_prefix("sql").unwrap_or(inner);
  inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plain_completions_are_only_trimmed() {
    assert_eq!(strip_fences("  SELECT 1;  "), "SELECT 1;");
  }

  #[test]
  fn code_fences_are_removed() {
    assert_eq!(strip_fences("```sql\nSELECT 1;\n```"), "SELECT 1;");
    assert_eq!(strip_fences("```\nSELECT 1;\n```"), "SELECT 1;");
  }
}
