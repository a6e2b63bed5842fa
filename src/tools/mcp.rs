//! Tools discovered from an external MCP server over stdio.
//!
//! The research agent does not implement documentation search itself. It
//! spawns the documentation server configured in `[docs_server]`, lists the
//! tools that server advertises and exposes each one as a local [`Tool`]
//! whose calls are proxied through `tools/call`.

use crate::tools::registry::Tool;
use crate::types::{AppError, Result, ToolDefinition};
use crate::utils::toml_config::DocsServerConfig;
use async_trait::async_trait;
use rmcp::model::{CallToolRequestParam, CallToolResult, RawContent};
use rmcp::service::RunningService;
use rmcp::transport::TokioChildProcess;
use rmcp::{RoleClient, ServiceExt};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

/// A remote tool server that can list and invoke tools
#[async_trait]
pub trait ToolServer: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>>;

    /// Invoke a tool and return its output flattened to text
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<String>;
}

/// Live MCP client session with a child-process server
pub struct McpSession {
    service: RunningService<RoleClient, ()>,
    label: String,
}

impl McpSession {
    /// Spawn the server process and complete the MCP handshake
    pub async fn connect(config: &DocsServerConfig) -> Result<Self> {
        let label = std::iter::once(config.command.as_str())
            .chain(config.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");

        tracing::info!(server = %label, "Starting MCP documentation server");

        let mut command = Command::new(&config.command);
        command.args(&config.args).envs(&config.env);

        let transport = TokioChildProcess::new(command)
            .map_err(|e| AppError::Tool(format!("Failed to spawn '{}': {}", label, e)))?;

        let service = tokio::time::timeout(
            Duration::from_secs(config.startup_timeout_secs),
            ().serve(transport),
        )
        .await
        .map_err(|_| {
            AppError::Tool(format!(
                "MCP server '{}' did not start within {} seconds",
                label, config.startup_timeout_secs
            ))
        })?
        .map_err(|e| AppError::Tool(format!("MCP handshake with '{}' failed: {}", label, e)))?;

        Ok(Self { service, label })
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

#[async_trait]
impl ToolServer for McpSession {
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>> {
        let tools = self
            .service
            .list_all_tools()
            .await
            .map_err(|e| AppError::Tool(format!("tools/list failed: {}", e)))?;

        Ok(tools.iter().map(definition_from_listing).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<String> {
        let arguments = match arguments {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => {
                return Err(AppError::InvalidInput(format!(
                    "Arguments for {} must be an object, got {}",
                    name, other
                )));
            }
        };

        let request = CallToolRequestParam {
            name: name.to_string().into(),
            arguments,
        };

        let result = self
            .service
            .call_tool(request)
            .await
            .map_err(|e| AppError::Tool(format!("tools/call {} failed: {}", name, e)))?;

        flatten_call_result(name, &result)
    }
}

/// Convert one entry of a `tools/list` response into a definition
fn definition_from_listing(tool: &rmcp::model::Tool) -> ToolDefinition {
    let parameters = if tool.input_schema.is_empty() {
        json!({"type": "object", "properties": {}})
    } else {
        Value::Object(tool.input_schema.as_ref().clone())
    };

    ToolDefinition {
        name: tool.name.to_string(),
        description: tool.description.as_deref().unwrap_or_default().to_string(),
        parameters,
    }
}

/// Join the text blocks of a `tools/call` result.
///
/// Non-text blocks are summarised by type. A result flagged `isError` becomes
/// an error carrying the same text.
fn flatten_call_result(name: &str, result: &CallToolResult) -> Result<String> {
    let blocks: Vec<String> = result
        .content
        .iter()
        .map(|block| match &block.raw {
            RawContent::Text(text) => text.text.clone(),
            other => format!("[{} content omitted]", content_kind(other)),
        })
        .collect();

    let mut text = blocks.join("\n\n");
    if text.is_empty()
        && let Some(structured) = &result.structured_content
    {
        text = structured.to_string();
    }

    if result.is_error.unwrap_or(false) {
        return Err(AppError::Tool(format!("{} reported an error: {}", name, text)));
    }

    Ok(text)
}

fn content_kind(content: &RawContent) -> &'static str {
    match content {
        RawContent::Text(_) => "text",
        RawContent::Image(_) => "image",
        RawContent::Resource(_) => "resource",
        RawContent::Audio(_) => "audio",
        RawContent::ResourceLink(_) => "resource_link",
    }
}

/// Local handle for one remote tool
pub struct RemoteTool {
    server: Arc<dyn ToolServer>,
    definition: ToolDefinition,
}

impl RemoteTool {
    pub fn new(server: Arc<dyn ToolServer>, definition: ToolDefinition) -> Self {
        Self { server, definition }
    }
}

#[async_trait]
impl Tool for RemoteTool {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn description(&self) -> &str {
        &self.definition.description
    }

    fn parameters_schema(&self) -> Value {
        self.definition.parameters.clone()
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let text = self.server.call_tool(&self.definition.name, args).await?;
        Ok(Value::String(text))
    }
}

/// Wrap every tool the server advertises
pub async fn discover_tools(server: Arc<dyn ToolServer>) -> Result<Vec<Arc<dyn Tool>>> {
    let definitions = server.list_tools().await?;
    if definitions.is_empty() {
        return Err(AppError::Tool(
            "Documentation server advertised no tools".to_string(),
        ));
    }

    tracing::info!(
        tools = ?definitions.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
        "Discovered MCP tools"
    );

    Ok(definitions
        .into_iter()
        .map(|definition| {
            Arc::new(RemoteTool::new(Arc::clone(&server), definition)) as Arc<dyn Tool>
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use rmcp::model::Content;

    struct FakeServer {
        calls: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl ToolServer for FakeServer {
        async fn list_tools(&self) -> Result<Vec<ToolDefinition>> {
            Ok(vec![
                ToolDefinition {
                    name: "search_documentation".to_string(),
                    description: "Search AWS docs".to_string(),
                    parameters: json!({"type": "object"}),
                },
                ToolDefinition {
                    name: "read_documentation".to_string(),
                    description: "Read an AWS docs page".to_string(),
                    parameters: json!({"type": "object"}),
                },
            ])
        }

        async fn call_tool(&self, name: &str, arguments: Value) -> Result<String> {
            self.calls.lock().push((name.to_string(), arguments));
            Ok(format!("result of {}", name))
        }
    }

    #[test]
    fn test_definition_from_listing() {
        let schema = json!({"type": "object", "properties": {"search_phrase": {"type": "string"}}});
        let listed = rmcp::model::Tool::new(
            "search_documentation",
            "Search AWS documentation",
            Arc::new(schema.as_object().cloned().unwrap()),
        );

        let def = definition_from_listing(&listed);
        assert_eq!(def.name, "search_documentation");
        assert_eq!(def.description, "Search AWS documentation");
        assert!(def.parameters["properties"]["search_phrase"].is_object());

        let mut bare = rmcp::model::Tool::new("recommend", "", Arc::new(serde_json::Map::new()));
        bare.description = None;
        let def = definition_from_listing(&bare);
        assert_eq!(def.description, "");
        assert_eq!(def.parameters["type"], "object");
    }

    #[test]
    fn test_flatten_text_blocks() {
        let result = CallToolResult::success(vec![
            Content::text("Lambda timeout is 900 seconds."),
            Content::image("...", "image/png"),
            Content::text("Source: docs.aws.amazon.com"),
        ]);

        let text = flatten_call_result("read_documentation", &result).unwrap();
        assert_eq!(
            text,
            "Lambda timeout is 900 seconds.\n\n[image content omitted]\n\nSource: docs.aws.amazon.com"
        );
    }

    #[test]
    fn test_flatten_structured_and_error() {
        let structured = CallToolResult {
            content: vec![],
            structured_content: Some(json!({"pages": 2})),
            is_error: None,
            meta: None,
        };
        assert_eq!(
            flatten_call_result("t", &structured).unwrap(),
            "{\"pages\":2}"
        );

        let failed = CallToolResult::error(vec![Content::text("bad url")]);
        let err = flatten_call_result("read_documentation", &failed).unwrap_err();
        assert!(err.to_string().contains("bad url"));
    }

    #[tokio::test]
    async fn test_discover_and_proxy() {
        let server = Arc::new(FakeServer {
            calls: Mutex::new(Vec::new()),
        });

        let tools = discover_tools(server.clone()).await.unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].name(), "search_documentation");

        let output = tools[1]
            .execute(json!({"url": "https://docs.aws.amazon.com/lambda/"}))
            .await
            .unwrap();
        assert_eq!(output, json!("result of read_documentation"));

        let calls = server.calls.lock();
        assert_eq!(calls[0].0, "read_documentation");
        assert_eq!(calls[0].1["url"], "https://docs.aws.amazon.com/lambda/");
    }

    #[tokio::test]
    async fn test_connect_missing_command() {
        let config = DocsServerConfig {
            command: "/nonexistent/mcp-server-binary".to_string(),
            args: vec![],
            startup_timeout_secs: 5,
            ..Default::default()
        };

        assert!(McpSession::connect(&config).await.is_err());
    }
}
