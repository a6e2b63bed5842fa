//! LLM Client abstractions and provider selection
//!
//! Every provider cloudvox supports speaks the OpenAI chat completions protocol:
//! - **OpenAI**: hosted API (or any compatible gateway)
//! - **Ollama**: local inference through Ollama's `/v1` endpoint

use crate::llm::coordinator::ConversationMessage;
use crate::types::{Result, ToolCall, ToolDefinition};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Generic LLM client trait for provider abstraction
///
/// All LLM providers implement this trait, allowing agents to be built
/// without knowing which backend serves their model.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Send a full conversation, optionally advertising tools.
    ///
    /// This is the only required method; the others are conveniences over it.
    async fn chat(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse>;

    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self.chat(&[ConversationMessage::user(prompt)], &[]).await?;
        Ok(response.content)
    }

    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        let messages = [
            ConversationMessage::system(system),
            ConversationMessage::user(prompt),
        ];
        let response = self.chat(&messages, &[]).await?;
        Ok(response.content)
    }

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Sum of two usage records
    pub fn add(&self, other: &TokenUsage) -> Self {
        Self::new(
            self.prompt_tokens + other.prompt_tokens,
            self.completion_tokens + other.completion_tokens,
        )
    }
}

/// Response from an LLM generation request
#[derive(Debug, Clone)]
pub struct LLMResponse {
    /// The text content of the response
    pub content: String,
    /// Any tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
    /// The reason generation stopped (e.g., "stop", "tool_calls", "length")
    pub finish_reason: String,
    pub usage: Option<TokenUsage>,
}

impl LLMResponse {
    /// A plain text response with no tool calls
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            finish_reason: "stop".to_string(),
            usage: None,
        }
    }
}

/// Sampling and transport settings shared by all providers
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 1024,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API provider (including compatible gateways)
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_key: "sk-...".to_string(),
    ///     api_base: "https://api.openai.com/v1".to_string(),
    ///     model: "gpt-4o-mini".to_string(),
    ///     settings: GenerationSettings::default(),
    /// };
    /// ```
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
        settings: GenerationSettings,
    },

    /// Ollama local LLM provider
    ///
    /// Pick a model with function calling support (`qwen2.5`, `llama3.1`),
    /// otherwise agents cannot reach their tools.
    Ollama {
        base_url: String,
        model: String,
        settings: GenerationSettings,
    },
}

impl Provider {
    /// Create a client instance for this provider
    pub fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            Provider::OpenAI {
                api_key,
                api_base,
                model,
                settings,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                Some(api_key.clone()),
                api_base.clone(),
                model.clone(),
                settings.clone(),
            )?)),

            Provider::Ollama {
                base_url,
                model,
                settings,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                None,
                ollama_api_base(base_url),
                model.clone(),
                settings.clone(),
            )?)),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }

    /// Model identifier sent to the provider
    pub fn model(&self) -> &str {
        match self {
            Provider::OpenAI { model, .. } | Provider::Ollama { model, .. } => model,
        }
    }
}

/// Ollama serves the OpenAI protocol under `/v1`
fn ollama_api_base(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        trimmed.to_string()
    } else {
        format!("{}/v1", trimmed)
    }
}
