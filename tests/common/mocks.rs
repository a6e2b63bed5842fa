//! Mock implementations for testing.
//!
//! This module provides mock LLM clients and agents that can be used
//! across different test files without duplication.

#![allow(dead_code)]

use async_trait::async_trait;
use cloudvox::agents::Agent;
use cloudvox::llm::{ConversationMessage, LLMClient, LLMResponse};
use cloudvox::types::{AgentName, AppError, Result, ToolCall, ToolDefinition};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

/// Mock LLM client that replays a script of responses.
///
/// Every request is recorded so tests can inspect the messages and tool
/// definitions the model would have seen.
///
/// # Examples
///
/// ```ignore
/// let client = MockLLMClient::scripted(vec![
///     MockLLMClient::tool_call("call_1", "list_invoices", json!({})),
///     LLMResponse::text("You have no invoices."),
/// ]);
/// ```
#[derive(Clone, Default)]
pub struct MockLLMClient {
    script: Arc<Mutex<VecDeque<LLMResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    should_fail: bool,
}

/// One `chat` call as the mock saw it
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub messages: Vec<ConversationMessage>,
    pub tool_names: Vec<String>,
}

impl MockLLMClient {
    /// Create a mock client that always answers with the given text.
    pub fn new(response: &str) -> Self {
        Self::scripted(vec![LLMResponse::text(response)])
    }

    /// Create a mock client that returns the responses in order.
    pub fn scripted(responses: Vec<LLMResponse>) -> Self {
        Self {
            script: Arc::new(Mutex::new(responses.into())),
            ..Default::default()
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// A response asking for one tool call
    pub fn tool_call(id: &str, name: &str, arguments: Value) -> LLMResponse {
        LLMResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments,
            }],
            finish_reason: "tool_calls".to_string(),
            usage: None,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn chat(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        self.requests.lock().push(RecordedRequest {
            messages: messages.to_vec(),
            tool_names: tools.iter().map(|t| t.name.clone()).collect(),
        });

        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }

        let mut script = self.script.lock();
        // The last scripted response repeats once the script runs out
        let response = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        response.ok_or_else(|| AppError::LLM("Mock script exhausted".to_string()))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Agent stand-in that records what it was asked
pub struct MockAgent {
    name: AgentName,
    reply: std::result::Result<String, String>,
    queries: Mutex<Vec<String>>,
}

impl MockAgent {
    /// Agent answering every query with `"<AgentName>: <reply>"`
    pub fn answering(name: AgentName, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            reply: Ok(reply.to_string()),
            queries: Mutex::new(Vec::new()),
        })
    }

    /// Agent whose every invocation fails with an LLM error
    pub fn failing(name: AgentName, detail: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            reply: Err(detail.to_string()),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl Agent for MockAgent {
    async fn invoke(&self, query: &str) -> Result<String> {
        self.queries.lock().push(query.to_string());
        match &self.reply {
            Ok(reply) => Ok(format!("{}: {}", self.name, reply)),
            Err(detail) => Err(AppError::LLM(detail.clone())),
        }
    }

    fn name(&self) -> AgentName {
        self.name
    }

    fn system_prompt(&self) -> String {
        format!("mock {}", self.name)
    }
}
