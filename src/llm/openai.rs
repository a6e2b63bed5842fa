//! OpenAI-compatible chat completions client
//!
//! Talks plain JSON over `reqwest`, so the same client serves the hosted OpenAI
//! API, gateways that mimic it, and Ollama's `/v1` endpoint.

use crate::llm::client::{GenerationSettings, LLMClient, LLMResponse, TokenUsage};
use crate::llm::coordinator::{ConversationMessage, MessageRole};
use crate::types::{AppError, Result, ToolCall, ToolDefinition};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub struct OpenAIClient {
    client: Client,
    api_key: Option<String>,
    api_base: String,
    model: String,
    settings: GenerationSettings,
}

impl OpenAIClient {
    pub fn new(
        api_key: Option<String>,
        api_base: String,
        model: String,
        settings: GenerationSettings,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AppError::LLM(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
            settings,
        })
    }

    fn build_request(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> ChatCompletionRequest {
        let tools: Vec<ChatTool> = tools.iter().map(ChatTool::from).collect();

        ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            temperature: Some(self.settings.temperature),
            max_tokens: Some(self.settings.max_tokens),
            tool_choice: if tools.is_empty() {
                None
            } else {
                Some("auto".to_string())
            },
            tools,
        }
    }
}

/// Convert the first choice of a completion into an [`LLMResponse`]
fn parse_response(response: ChatCompletionResponse) -> Result<LLMResponse> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AppError::LLM("No choices returned by the model".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| {
            // Some models emit an empty string for argument-less calls
            let arguments = if call.function.arguments.trim().is_empty() {
                serde_json::json!({})
            } else {
                serde_json::from_str(&call.function.arguments).map_err(|e| {
                    AppError::LLM(format!(
                        "Invalid arguments for tool '{}': {}",
                        call.function.name, e
                    ))
                })?
            };
            Ok(ToolCall {
                id: call.id,
                name: call.function.name,
                arguments,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(LLMResponse {
        content: choice.message.content.unwrap_or_default(),
        tool_calls,
        finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
        usage: response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
    })
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn chat(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let request = self.build_request(messages, tools);

        debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "Sending chat completion request"
        );

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .json(&request);

        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::LLM(format!("Request to {} failed: {}", self.api_base, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Chat completion request rejected");
            return Err(AppError::LLM(format!("API error {}: {}", status, body)));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLM(format!("Failed to parse response: {}", e)))?;

        let result = parse_response(parsed)?;

        debug!(
            finish_reason = %result.finish_reason,
            tool_calls = result.tool_calls.len(),
            "Chat completion received"
        );

        Ok(result)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============= Wire Types =============

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ChatTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ChatToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&ConversationMessage> for ChatMessage {
    fn from(message: &ConversationMessage) -> Self {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        };

        let tool_calls = if message.tool_calls.is_empty() {
            None
        } else {
            Some(
                message
                    .tool_calls
                    .iter()
                    .map(|call| ChatToolCall {
                        id: call.id.clone(),
                        call_type: "function".to_string(),
                        function: ChatFunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.to_string(),
                        },
                    })
                    .collect(),
            )
        };

        // An assistant turn that only carries tool calls has null content
        let content = if tool_calls.is_some() && message.content.is_empty() {
            None
        } else {
            Some(message.content.clone())
        };

        Self {
            role,
            content,
            tool_calls,
            tool_call_id: message.tool_call_id.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ChatFunction,
}

impl From<&ToolDefinition> for ChatTool {
    fn from(def: &ToolDefinition) -> Self {
        Self {
            tool_type: "function",
            function: ChatFunction {
                name: def.name.clone(),
                description: def.description.clone(),
                parameters: def.parameters.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatToolCall {
    id: String,
    #[serde(rename = "type", default = "default_call_type")]
    call_type: String,
    function: ChatFunctionCall,
}

fn default_call_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> OpenAIClient {
        OpenAIClient::new(
            Some("sk-test".to_string()),
            "https://api.example.com/v1/".to_string(),
            "gpt-4o-mini".to_string(),
            GenerationSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        assert_eq!(client().api_base, "https://api.example.com/v1");
    }

    #[test]
    fn test_request_without_tools_omits_tool_fields() {
        let request = client().build_request(&[ConversationMessage::user("hi")], &[]);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "gpt-4o-mini");
        assert!(value.get("tools").is_none());
        assert!(value.get("tool_choice").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn test_request_serializes_tool_turns() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "get_invoice".to_string(),
            arguments: json!({"invoice_number": "INV-001"}),
        };
        let messages = vec![
            ConversationMessage::system("sys"),
            ConversationMessage::user("show INV-001"),
            ConversationMessage::assistant("", vec![call]),
            ConversationMessage::tool_result("call_1", &json!({"status": "draft"})),
        ];
        let tools = vec![ToolDefinition {
            name: "get_invoice".to_string(),
            description: "Fetch one invoice".to_string(),
            parameters: json!({"type": "object"}),
        }];

        let value = serde_json::to_value(client().build_request(&messages, &tools)).unwrap();

        assert_eq!(value["tool_choice"], "auto");
        assert_eq!(value["tools"][0]["type"], "function");
        assert_eq!(value["tools"][0]["function"]["name"], "get_invoice");

        let assistant = &value["messages"][2];
        assert!(assistant.get("content").is_none());
        assert_eq!(assistant["tool_calls"][0]["function"]["name"], "get_invoice");
        let args: serde_json::Value = serde_json::from_str(
            assistant["tool_calls"][0]["function"]["arguments"]
                .as_str()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(args["invoice_number"], "INV-001");

        assert_eq!(value["messages"][3]["role"], "tool");
        assert_eq!(value["messages"][3]["tool_call_id"], "call_1");
    }

    #[test]
    fn test_parse_response_with_tool_calls() {
        let raw = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_9",
                        "type": "function",
                        "function": {"name": "list_ec2_instances", "arguments": ""}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        });

        let parsed = parse_response(serde_json::from_value(raw).unwrap()).unwrap();

        assert_eq!(parsed.content, "");
        assert_eq!(parsed.finish_reason, "tool_calls");
        assert_eq!(parsed.tool_calls.len(), 1);
        assert_eq!(parsed.tool_calls[0].arguments, json!({}));
        assert_eq!(parsed.usage, Some(TokenUsage::new(12, 3)));
    }

    #[test]
    fn test_parse_response_rejects_bad_arguments() {
        let raw = json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "id": "call_1",
                        "function": {"name": "get_invoice", "arguments": "{not json"}
                    }]
                }
            }]
        });

        let err = parse_response(serde_json::from_value(raw).unwrap()).unwrap_err();
        assert!(err.to_string().contains("get_invoice"));
    }

    #[test]
    fn test_parse_response_without_choices() {
        let raw = json!({"choices": []});
        assert!(parse_response(serde_json::from_value(raw).unwrap()).is_err());
    }
}
