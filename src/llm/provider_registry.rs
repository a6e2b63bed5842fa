//! Provider Registry for managing multiple LLM providers
//!
//! This module provides a registry for named LLM providers and models
//! as declared in the `[providers]` and `[models]` tables of `cloudvox.toml`.

use crate::llm::client::{GenerationSettings, LLMClient, Provider};
use crate::types::{AppError, Result};
use crate::utils::toml_config::{CloudvoxConfig, ModelConfig, ProviderConfig, resolve_env};
use std::collections::HashMap;
use std::time::Duration;

/// Registry for managing multiple named LLM providers
///
/// The ProviderRegistry holds provider and model configurations and creates
/// LLM clients for specific models by name.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    /// Provider configurations keyed by name
    providers: HashMap<String, ProviderConfig>,
    /// Model configurations keyed by name
    models: HashMap<String, ModelConfig>,
}

impl ProviderRegistry {
    /// Create a new empty provider registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider registry from TOML configuration
    pub fn from_config(config: &CloudvoxConfig) -> Self {
        Self {
            providers: config.providers.clone(),
            models: config.models.clone(),
        }
    }

    /// Register a provider configuration
    pub fn register_provider(&mut self, name: &str, config: ProviderConfig) {
        self.providers.insert(name.to_string(), config);
    }

    /// Register a model configuration
    pub fn register_model(&mut self, name: &str, config: ModelConfig) {
        self.models.insert(name.to_string(), config);
    }

    /// Get a provider configuration by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Get a model configuration by name
    pub fn get_model(&self, name: &str) -> Option<&ModelConfig> {
        self.models.get(name)
    }

    /// Get all model names, sorted
    pub fn model_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Check if a model exists in the registry
    pub fn has_model(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Resolve a model name to a concrete [`Provider`]
    ///
    /// This follows the model -> provider chain and reads the API key from
    /// the environment variable named by the provider.
    pub fn resolve(&self, model_name: &str) -> Result<Provider> {
        let model_config = self.get_model(model_name).ok_or_else(|| {
            AppError::Configuration(format!("Model '{}' not found in configuration", model_name))
        })?;

        let provider_config = self.get_provider(&model_config.provider).ok_or_else(|| {
            AppError::Configuration(format!(
                "Provider '{}' referenced by model '{}' not found",
                model_config.provider, model_name
            ))
        })?;

        Provider::from_model_config(model_config, provider_config)
    }

    /// Create an LLM client for a specific model by name
    pub fn create_client_for_model(&self, model_name: &str) -> Result<Box<dyn LLMClient>> {
        let provider = self.resolve(model_name)?;
        tracing::debug!(
            model = model_name,
            provider = provider.name(),
            "Creating LLM client"
        );
        provider.create_client()
    }
}

impl Provider {
    /// Build a provider from a model entry and the provider it references
    pub fn from_model_config(model: &ModelConfig, provider: &ProviderConfig) -> Result<Self> {
        let settings = GenerationSettings {
            temperature: model.temperature,
            max_tokens: model.max_tokens,
            timeout: Duration::from_secs(model.timeout_secs),
        };

        match provider {
            ProviderConfig::OpenAI {
                api_key_env,
                api_base,
                ..
            } => {
                let api_key = resolve_env(api_key_env)?;
                Ok(Provider::OpenAI {
                    api_key,
                    api_base: api_base.clone(),
                    model: model.model.clone(),
                    settings,
                })
            }
            ProviderConfig::Ollama { base_url, .. } => Ok(Provider::Ollama {
                base_url: base_url.clone(),
                model: model.model.clone(),
                settings,
            }),
        }
    }
}
