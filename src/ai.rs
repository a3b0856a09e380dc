//! Chat-completion client.
//!
//! This module handles the round trip to an OpenAI-compatible
//! `/chat/completions` endpoint. Callers depend on the [`ChatCompletion`]
//! trait so the transcript logic never touches HTTP directly.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::transcript::Turn;

/// Something that can turn a conversation into the next assistant reply.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Requests the next assistant message for `turns`.
    ///
    /// # Returns
    /// The reply content with surrounding whitespace trimmed.
    ///
    /// # Errors
    /// Returns an error if the service is unreachable or answers with a
    /// failure.
    async fn complete(&self, turns: &[Turn]) -> Result<String>;
}

/// Chat client for OpenAI-compatible completion APIs.
///
/// # Details
/// Holds a shared reqwest client plus the endpoint, credentials and model
/// name. Cloning is cheap; the underlying connection pool is shared.
#[derive(Clone)]
pub struct OpenAiChat {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

/// Request body for the completion endpoint.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
}

/// Response body; only the fields the agent reads.
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChat {
    /// Creates a chat client.
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client (carries the request timeout).
    /// * `api_base` - Base URL such as `https://api.openai.com/v1`.
    /// * `api_key` - Bearer token.
    /// * `model` - Model identifier, e.g. `gpt-4o`.
    pub fn new(
        client: reqwest::Client,
        api_base: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint(api_base, "chat/completions"),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatCompletion for OpenAiChat {
    async fn complete(&self, turns: &[Turn]) -> Result<String> {
        tracing::debug!(model = %self.model, turns = turns.len(), "requesting completion");
        let request = ChatRequest {
            model: &self.model,
            messages: turns,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .with_context(|| "Failed to send request to the completion service")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Completion service returned {}: {}", status, body.trim());
        }
        let parsed: ChatResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse completion response")?;
        first_reply(parsed)
    }
}

/// Joins a base URL and a path segment without doubling slashes.
pub(crate) fn endpoint(api_base: &str, path: &str) -> String {
    format!("{}/{}", api_base.trim_end_matches('/'), path)
}

/// Extracts the first choice's content, trimmed.
fn first_reply(response: ChatResponse) -> Result<String> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .context("Completion response contained no choices")?;
    Ok(choice
        .message
        .content
        .unwrap_or_default()
        .trim()
        .to_string())
}
