//! LLM Provider Clients and Abstractions
//!
//! This module provides a unified interface for talking to chat models.
//! Provider specifics stay behind the [`LLMClient`] trait so agents only see
//! messages, tool definitions and responses.
//!
//! # Architecture
//!
//! - [`LLMClient`] - The core trait that all providers implement
//! - [`Provider`] - Runtime provider selection, resolved from configuration
//! - [`ProviderRegistry`] - Named providers and models from `cloudvox.toml`
//! - [`ToolCoordinator`] - Multi-turn tool calling loop over any client

/// Core LLM client trait and response types.
pub mod client;
/// Tool calling loop shared by all agents.
pub mod coordinator;
/// OpenAI-compatible HTTP client (OpenAI, Ollama `/v1`).
pub mod openai;
/// Registry for managing multiple LLM provider instances.
pub mod provider_registry;

pub use client::{GenerationSettings, LLMClient, LLMResponse, Provider, TokenUsage};
pub use coordinator::{
    ConversationMessage, CoordinatorResult, FinishReason, MessageRole, ToolCallingConfig,
    ToolCoordinator,
};
pub use provider_registry::ProviderRegistry;
