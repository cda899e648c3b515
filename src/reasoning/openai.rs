//! OpenAI-compatible chat completion provider.
//!
//! Serves both the `openai` and `deepseek` backends; they share the
//! `/chat/completions` wire format and differ only in base URL and model.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ReasoningConfig;
use crate::error::{ReasoningError, Result};
use crate::reasoning::{ChatMessage, ReasoningProvider};

/// OpenAI-compatible chat provider.
pub struct OpenAiCompatProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatProvider {
    /// Create a new provider from configuration.
    pub fn from_config(config: &ReasoningConfig) -> Result<Self> {
        let api_key = config
            .resolve_api_key()
            .ok_or(ReasoningError::MissingApiKey(config.backend.api_key_env()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ReasoningError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            model: config.model(),
            api_key,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ReasoningProvider for OpenAiCompatProvider {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(ReasoningError::Http)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ReasoningError::Status { status, body }.into());
        }

        let payload: CompletionResponse = response.json().await.map_err(ReasoningError::Http)?;
        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ReasoningError::MissingContent)?;

        Ok(content)
    }

    fn id(&self) -> &'static str {
        "openai-compat"
    }
}
