//! Google Gemini chat provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ReasoningConfig;
use crate::error::{ReasoningError, Result};
use crate::reasoning::{ChatMessage, ReasoningProvider, Role};

/// Gemini `generateContent` provider.
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GeminiProvider {
    /// Create a new Gemini provider from configuration.
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

    fn map_role(role: Role) -> &'static str {
        // Gemini uses "model" where the chat format says "assistant".
        match role {
            Role::Assistant => "model",
            Role::User | Role::System => "user",
        }
    }
}

#[async_trait]
impl ReasoningProvider for GeminiProvider {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = GenerateRequest {
            contents: messages
                .iter()
                .map(|msg| Content {
                    role: Some(Self::map_role(msg.role).to_string()),
                    parts: vec![Part {
                        text: msg.content.clone(),
                    }],
                })
                .collect(),
            generation_config: GenerationConfig {
                max_output_tokens: self.max_tokens,
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&request)
            .send()
            .await
            .map_err(ReasoningError::Http)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ReasoningError::Status { status, body }.into());
        }

        let payload: GenerateResponse = response.json().await.map_err(ReasoningError::Http)?;
        let content = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|text| !text.is_empty())
            .ok_or(ReasoningError::MissingContent)?;

        Ok(content)
    }

    fn id(&self) -> &'static str {
        "gemini"
    }
}
