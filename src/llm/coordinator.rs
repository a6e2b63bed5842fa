//! Generic Tool Coordinator for Multi-Turn Tool Calling
//!
//! `ToolCoordinator` works with any `LLMClient` implementation and runs the
//! complete tool calling loop for one user turn:
//!
//! 1. Send the conversation with available tools to the LLM
//! 2. If the model requests tool calls, execute them
//! 3. Send tool results back to the model
//! 4. Repeat until completion or max iterations
//!
//! # Example
//!
//! ```rust,ignore
//! use cloudvox::llm::coordinator::{ToolCoordinator, ToolCallingConfig};
//! use cloudvox::tools::ToolRegistry;
//! use std::sync::Arc;
//!
//! let client = registry.create_client_for_model("default")?;
//! let tools = Arc::new(ToolRegistry::new());
//! let coordinator = ToolCoordinator::new(client, tools, ToolCallingConfig::default());
//!
//! let result = coordinator
//!     .execute(Some("You are a helpful assistant."), &[], "Which instances are stopped?")
//!     .await?;
//! println!("{}", result.content);
//! ```

use crate::llm::client::{LLMClient, TokenUsage};
use crate::tools::registry::ToolRegistry;
use crate::types::{Result, ToolCall};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Configuration for tool calling coordination behavior.
#[derive(Debug, Clone)]
pub struct ToolCallingConfig {
    /// Maximum number of LLM iterations (not tool calls) before stopping.
    /// Each iteration is one round-trip to the LLM.
    pub max_iterations: usize,

    /// Whether to execute multiple tool calls in parallel.
    /// When false, tools are executed sequentially.
    pub parallel_execution: bool,

    /// Timeout for individual tool execution.
    pub tool_timeout: Duration,

    /// Whether to stop on the first tool error, or report it to the model and continue.
    pub stop_on_error: bool,
}

impl Default for ToolCallingConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            parallel_execution: true,
            tool_timeout: Duration::from_secs(30),
            stop_on_error: false,
        }
    }
}

/// Record of a single tool call execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Identifier assigned to the call by the LLM.
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
    /// Result returned by the tool (or error object).
    pub result: serde_json::Value,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl ToolCallRecord {
    fn failed(call: &ToolCall, message: String, duration_ms: u64) -> Self {
        Self {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
            result: serde_json::json!({ "error": message }),
            success: false,
            duration_ms,
            error: Some(message),
        }
    }
}

/// Reason why a tool coordination session ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FinishReason {
    /// Model decided to stop (no more tool calls).
    Stop,
    /// Hit the maximum iterations limit.
    MaxIterations,
    /// Model tried to call a tool outside its tool set.
    UnknownTool(String),
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinishReason::Stop => write!(f, "stop"),
            FinishReason::MaxIterations => write!(f, "max_iterations"),
            FinishReason::UnknownTool(t) => write!(f, "unknown_tool: {}", t),
        }
    }
}

/// A message in a tool-calling conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
    /// Tool calls requested by the assistant (only for Assistant role).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Call this message answers (only for Tool role).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// Role of a message sender in a tool-calling conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl ConversationMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create an assistant message with optional tool calls.
    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, result: &serde_json::Value) -> Self {
        let content = match result {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        Self {
            role: MessageRole::Tool,
            content,
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Result of a complete tool coordination session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorResult {
    /// Final text response from the model.
    pub content: String,

    /// All tool calls made during the session.
    pub tool_calls: Vec<ToolCallRecord>,

    /// Number of LLM iterations (round-trips) performed.
    pub iterations: usize,

    pub finish_reason: FinishReason,

    /// Accumulated token usage across all iterations.
    pub total_usage: TokenUsage,

    /// Messages exchanged in this session, excluding the system prompt and prior history.
    pub message_history: Vec<ConversationMessage>,
}

/// Messages and bookkeeping for one `execute` call
struct Session {
    messages: Vec<ConversationMessage>,
    /// Index of the first message that belongs to this turn
    turn_start: usize,
    records: Vec<ToolCallRecord>,
    usage: TokenUsage,
}

impl Session {
    fn open(system: Option<&str>, history: &[ConversationMessage], prompt: &str) -> Self {
        let mut messages = Vec::with_capacity(history.len() + 2);
        if let Some(system) = system {
            messages.push(ConversationMessage::system(system));
        }
        messages.extend_from_slice(history);
        let turn_start = messages.len();
        messages.push(ConversationMessage::user(prompt));

        Self {
            messages,
            turn_start,
            records: Vec::new(),
            usage: TokenUsage::default(),
        }
    }

    fn close(
        mut self,
        content: String,
        iterations: usize,
        finish_reason: FinishReason,
    ) -> CoordinatorResult {
        CoordinatorResult {
            content,
            tool_calls: self.records,
            iterations,
            finish_reason,
            total_usage: self.usage,
            message_history: self.messages.split_off(self.turn_start),
        }
    }
}

/// Generic tool coordinator that works with any LLMClient.
///
/// The coordinator only ever advertises and executes tools present in its
/// registry, so handing it a filtered registry bounds what the model can do.
pub struct ToolCoordinator {
    client: Box<dyn LLMClient>,
    registry: Arc<ToolRegistry>,
    config: ToolCallingConfig,
}

impl ToolCoordinator {
    pub fn new(
        client: Box<dyn LLMClient>,
        registry: Arc<ToolRegistry>,
        config: ToolCallingConfig,
    ) -> Self {
        Self {
            client,
            registry,
            config,
        }
    }

    /// Create a new ToolCoordinator with default configuration.
    pub fn with_defaults(client: Box<dyn LLMClient>, registry: Arc<ToolRegistry>) -> Self {
        Self::new(client, registry, ToolCallingConfig::default())
    }

    /// Run one user turn to completion.
    ///
    /// `history` holds prior user/assistant turns, oldest first. Only the
    /// messages produced by this turn end up in
    /// [`CoordinatorResult::message_history`].
    pub async fn execute(
        &self,
        system: Option<&str>,
        history: &[ConversationMessage],
        prompt: &str,
    ) -> Result<CoordinatorResult> {
        let tools = self.registry.get_tool_definitions();
        let mut session = Session::open(system, history, prompt);

        for iteration in 1..=self.config.max_iterations {
            let response = self.client.chat(&session.messages, &tools).await?;
            if let Some(usage) = &response.usage {
                session.usage = session.usage.add(usage);
            }
            session.messages.push(ConversationMessage::assistant(
                &response.content,
                response.tool_calls.clone(),
            ));

            if response.tool_calls.is_empty() {
                return Ok(session.close(response.content, iteration, FinishReason::Stop));
            }

            if let Some(unknown) = response
                .tool_calls
                .iter()
                .find(|call| !self.registry.has_tool(&call.name))
            {
                tracing::warn!(tool = %unknown.name, "Model requested a tool outside its tool set");
                let reason = FinishReason::UnknownTool(unknown.name.clone());
                return Ok(session.close(response.content, iteration, reason));
            }

            for record in self.execute_tool_calls(&response.tool_calls).await? {
                session
                    .messages
                    .push(ConversationMessage::tool_result(&record.id, &record.result));
                session.records.push(record);
            }
        }

        tracing::warn!(
            max_iterations = self.config.max_iterations,
            "Tool loop hit the iteration limit"
        );

        // Whatever the model last said is the best partial answer
        let content = session
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant && !m.content.is_empty())
            .map(|m| m.content.clone())
            .unwrap_or_default();

        Ok(session.close(
            content,
            self.config.max_iterations,
            FinishReason::MaxIterations,
        ))
    }

    /// Execute tool calls, either in parallel or sequentially based on config.
    async fn execute_tool_calls(&self, calls: &[ToolCall]) -> Result<Vec<ToolCallRecord>> {
        let records = if self.config.parallel_execution {
            join_all(calls.iter().map(|call| self.execute_single_tool(call))).await
        } else {
            let mut records = Vec::with_capacity(calls.len());
            for call in calls {
                let record = self.execute_single_tool(call).await;
                let failed = !record.success;
                records.push(record);
                if failed && self.config.stop_on_error {
                    break;
                }
            }
            records
        };

        if self.config.stop_on_error
            && let Some(failed) = records.iter().find(|r| !r.success)
        {
            return Err(crate::types::AppError::Tool(format!(
                "{} failed: {}",
                failed.name,
                failed.error.as_deref().unwrap_or("unknown error")
            )));
        }

        Ok(records)
    }

    /// Execute a single tool call with timeout.
    async fn execute_single_tool(&self, call: &ToolCall) -> ToolCallRecord {
        let start = Instant::now();

        let result = timeout(
            self.config.tool_timeout,
            self.registry.execute(&call.name, call.arguments.clone()),
        )
        .await;

        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(value)) => {
                tracing::debug!(tool = %call.name, duration_ms, "Tool call succeeded");
                ToolCallRecord {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                    result: value,
                    success: true,
                    duration_ms,
                    error: None,
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool call failed");
                ToolCallRecord::failed(call, e.to_string(), duration_ms)
            }
            Err(_) => {
                tracing::warn!(tool = %call.name, duration_ms, "Tool call timed out");
                ToolCallRecord::failed(call, "Tool execution timed out".to_string(), duration_ms)
            }
        }
    }

    /// Get a reference to the underlying LLM client.
    pub fn client(&self) -> &dyn LLMClient {
        self.client.as_ref()
    }

    /// Get a reference to the tool registry.
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ToolCallingConfig {
        &self.config
    }
}
