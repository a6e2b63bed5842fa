//! # cloudvox
//!
//! A keyword-routed multi-agent assistant for AWS operations. Each question is
//! sent to exactly one of three LLM-backed agents:
//!
//! - **EC2Agent** - instance listings and status checks through the AWS CLI
//! - **AWSResearcherAgent** - answers from the AWS documentation, via an MCP
//!   documentation server
//! - **InvoiceAgent** - invoice CRUD and totals against a PostgREST table
//!
//! ## Overview
//!
//! cloudvox can be used in two ways:
//!
//! 1. **As a CLI** - Run the `cloudvox` binary (`ask`, `chat`, `route`, ...)
//! 2. **As a library** - Build a [`Router`] over your own [`Agent`] implementations
//!
//! ### Routing
//!
//! ```rust,ignore
//! use cloudvox::{AgentRegistry, CloudvoxConfig, Router};
//! use std::sync::Arc;
//!
//! let config = CloudvoxConfig::load("cloudvox.toml")?;
//! config.validate()?;
//!
//! let registry = AgentRegistry::from_config(&config).await?;
//! let router = Router::new(Arc::new(registry), &config.router);
//!
//! // Always returns text, even when the agent fails
//! let answer = router.route("Is my web server instance running?").await;
//! ```
//!
//! ### Classification only
//!
//! ```rust,ignore
//! let decision = router.classify("ec2 lambda trigger");
//! assert_eq!(decision.agent, AgentName::AwsResearcher);
//! ```
//!
//! ## Modules
//!
//! - [`agents`] - Agent trait, domain agents, registry and router
//! - [`cli`] - Command-line parsing and output
//! - [`db`] - Invoice model and stores (PostgREST, memory)
//! - [`llm`] - LLM clients and the tool calling loop
//! - [`memory`] - Per-agent conversation windows
//! - [`tools`] - EC2, invoice and MCP documentation tools
//! - [`types`] - Agent names, tool types and errors
//! - [`utils`] - Configuration and logging

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Agents, the agent registry and the keyword router.
pub mod agents;
/// Command-line interface.
pub mod cli;
/// Invoice persistence.
pub mod db;
/// LLM provider clients and abstractions.
pub mod llm;
/// Conversation memory.
pub mod memory;
/// Tools the agents can call.
pub mod tools;
/// Core types (agent names, tool calls, errors).
pub mod types;
/// Configuration and logging utilities.
pub mod utils;

// Re-export commonly used types
pub use agents::{
    Agent, AgentRegistry, AgentRegistryBuilder, Router, RoutingDecision, RoutingError,
};
pub use llm::{LLMClient, LLMResponse, Provider, ProviderRegistry};
pub use tools::registry::ToolRegistry;
pub use types::{AgentName, AppError, Result};
pub use utils::toml_config::CloudvoxConfig;
