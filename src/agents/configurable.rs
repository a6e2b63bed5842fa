//! Configurable Agent implementation
//!
//! This module provides the generic agent behind all three domain agents.
//! Domain modules supply instructions and tool names; everything else
//! (model, prompt override, memory window, tool loop limits) comes from the
//! agent's `[agents.*]` table in `cloudvox.toml`.

use crate::agents::{Agent, compose_system_prompt};
use crate::llm::LLMClient;
use crate::llm::coordinator::{FinishReason, ToolCallingConfig, ToolCoordinator};
use crate::memory::ConversationWindow;
use crate::tools::registry::ToolRegistry;
use crate::types::{AgentName, AppError, Result};
use crate::utils::toml_config::AgentConfig;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// A configurable agent that derives its behavior from TOML configuration
pub struct ConfigurableAgent {
    name: AgentName,
    system_prompt: String,
    /// Runs the tool loop against this agent's own tool subset
    coordinator: ToolCoordinator,
    window: ConversationWindow,
}

impl ConfigurableAgent {
    /// Create a new configurable agent from TOML config
    ///
    /// # Arguments
    ///
    /// * `name` - Which agent this is
    /// * `config` - The agent's `[agents.*]` section
    /// * `instructions` - Built-in domain instructions, replaced by `config.system_prompt` when set
    /// * `default_window` - Memory window used when the config sets none
    /// * `llm` - The LLM client (already created from the model config)
    /// * `tools` - The tools this agent may call, and nothing else
    pub fn new(
        name: AgentName,
        config: &AgentConfig,
        instructions: &str,
        default_window: usize,
        llm: Box<dyn LLMClient>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        let instructions = config.system_prompt.as_deref().unwrap_or(instructions);
        let tool_config = ToolCallingConfig {
            max_iterations: config.max_tool_iterations,
            parallel_execution: config.parallel_tools,
            tool_timeout: Duration::from_secs(config.tool_timeout_secs),
            stop_on_error: false,
        };

        Self::with_params(
            name,
            llm,
            compose_system_prompt(instructions),
            tools,
            config.conversation_window.unwrap_or(default_window),
            tool_config,
        )
    }

    /// Create a new configurable agent with explicit parameters
    pub fn with_params(
        name: AgentName,
        llm: Box<dyn LLMClient>,
        system_prompt: String,
        tools: Arc<ToolRegistry>,
        window_size: usize,
        tool_config: ToolCallingConfig,
    ) -> Self {
        Self {
            name,
            system_prompt,
            coordinator: ToolCoordinator::new(llm, tools, tool_config),
            window: ConversationWindow::new(window_size),
        }
    }

    /// Names of the tools this agent can call
    pub fn allowed_tools(&self) -> Vec<String> {
        self.coordinator.registry().tool_names()
    }

    /// Check if a specific tool is allowed for this agent
    pub fn can_use_tool(&self, tool_name: &str) -> bool {
        self.coordinator.registry().has_tool(tool_name)
    }

    pub fn max_tool_iterations(&self) -> usize {
        self.coordinator.config().max_iterations
    }

    pub fn model_name(&self) -> &str {
        self.coordinator.client().model_name()
    }

    pub fn window(&self) -> &ConversationWindow {
        &self.window
    }
}

#[async_trait]
impl Agent for ConfigurableAgent {
    async fn invoke(&self, query: &str) -> Result<String> {
        let history = self.window.snapshot();

        tracing::debug!(
            agent = %self.name,
            history = history.len(),
            "Invoking agent"
        );

        let result = self
            .coordinator
            .execute(Some(&self.system_prompt), &history, query)
            .await?;

        tracing::info!(
            agent = %self.name,
            iterations = result.iterations,
            tool_calls = result.tool_calls.len(),
            finish_reason = %result.finish_reason,
            tokens = result.total_usage.total_tokens,
            "Agent finished"
        );

        let answer = match result.finish_reason {
            FinishReason::Stop => result.content,
            FinishReason::UnknownTool(tool) => {
                return Err(AppError::Tool(format!(
                    "model requested unavailable tool '{}'",
                    tool
                )));
            }
            FinishReason::MaxIterations if !result.content.trim().is_empty() => result.content,
            FinishReason::MaxIterations => {
                return Err(AppError::Tool(format!(
                    "no answer after {} tool iterations",
                    result.iterations
                )));
            }
        };

        if answer.trim().is_empty() {
            return Err(AppError::LLM("model returned an empty response".to_string()));
        }

        self.window.record_exchange(query, &answer);
        Ok(answer)
    }

    fn name(&self) -> AgentName {
        self.name
    }

    fn system_prompt(&self) -> String {
        self.system_prompt.clone()
    }
}
