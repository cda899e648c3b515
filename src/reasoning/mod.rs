//! External reasoning service module.
//!
//! A reasoning provider turns a chat-style prompt into free text; the
//! verdict layer on top owns the pairwise interaction prompt and the
//! defensive parsing of the response. The backend is chosen once at
//! startup from configuration and injected where needed; it is never
//! re-read per call.

mod gemini;
mod openai;
mod verdict;

pub use gemini::GeminiProvider;
pub use openai::OpenAiCompatProvider;
pub use verdict::{pair_prompt, parse_verdict, VerdictPayload};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{ReasoningBackend, ReasoningConfig};
use crate::error::Result;

/// Chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Trait for reasoning providers.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    /// Send a chat completion request and return the raw text content.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Short identifier for logging.
    fn id(&self) -> &'static str;
}

/// Create a reasoning provider from configuration.
pub fn create_provider(config: &ReasoningConfig) -> Result<Box<dyn ReasoningProvider>> {
    match config.backend {
        ReasoningBackend::OpenAi | ReasoningBackend::DeepSeek => {
            Ok(Box::new(OpenAiCompatProvider::from_config(config)?))
        }
        ReasoningBackend::Gemini => Ok(Box::new(GeminiProvider::from_config(config)?)),
    }
}
