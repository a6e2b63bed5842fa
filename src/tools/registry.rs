use crate::types::{AppError, Result, ToolDefinition};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    async fn execute(&self, args: Value) -> Result<Value>;
}

/// Deserialize tool arguments into a typed struct
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    // Models sometimes send `null` for argument-less calls
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args)
        .map_err(|e| AppError::InvalidInput(format!("Invalid arguments for {}: {}", tool, e)))
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Register every tool in the iterator
    pub fn register_all(&mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) {
        for tool in tools {
            self.register(tool);
        }
    }

    /// Build a registry holding only the named tools.
    ///
    /// Fails when a name is not registered, so a typo in an agent's tool list
    /// surfaces at startup instead of as a silently missing capability.
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> Result<ToolRegistry> {
        let mut subset = ToolRegistry::new();
        for name in names {
            let name = name.as_ref();
            let tool = self
                .tools
                .get(name)
                .ok_or_else(|| AppError::NotFound(format!("Tool not found: {}", name)))?;
            subset.register(Arc::clone(tool));
        }
        Ok(subset)
    }

    /// Tool definitions sorted by name
    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    pub async fn execute(&self, name: &str, args: Value) -> Result<Value> {
        if let Some(tool) = self.tools.get(name) {
            tool.execute(args).await
        } else {
            Err(AppError::NotFound(format!("Tool not found: {}", name)))
        }
    }

    /// Get a sorted list of all registered tool names
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a tool is registered
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    struct Named(&'static str);

    #[async_trait]
    impl Tool for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "test tool"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _args: Value) -> Result<Value> {
            Ok(json!({ "tool": self.0 }))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register_all([
            Arc::new(Named("list_invoices")) as Arc<dyn Tool>,
            Arc::new(Named("get_invoice")),
            Arc::new(Named("list_ec2_instances")),
        ]);
        registry
    }

    #[test]
    fn test_registry_creation() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.tool_names().len(), 0);
    }

    #[test]
    fn test_get_tool_definitions_sorted() {
        let definitions = registry().get_tool_definitions();

        let names: Vec<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["get_invoice", "list_ec2_instances", "list_invoices"]);
        for def in &definitions {
            assert!(!def.description.is_empty());
            assert!(def.parameters.is_object());
        }
    }

    #[test]
    fn test_subset() {
        let subset = registry().subset(&["get_invoice", "list_invoices"]).unwrap();

        assert_eq!(subset.len(), 2);
        assert!(subset.has_tool("get_invoice"));
        assert!(!subset.has_tool("list_ec2_instances"));
    }

    #[test]
    fn test_subset_unknown_tool() {
        let err = registry().subset(&["drop_table"]).err().unwrap();
        assert!(err.to_string().contains("drop_table"));
    }

    #[tokio::test]
    async fn test_execute() {
        let value = registry()
            .execute("get_invoice", json!({}))
            .await
            .unwrap();
        assert_eq!(value["tool"], "get_invoice");
    }

    #[tokio::test]
    async fn test_nonexistent_tool() {
        let result = registry().execute("nonexistent_tool", json!({})).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_parse_args() {
        #[derive(Deserialize)]
        struct Args {
            state: Option<String>,
        }

        let args: Args = parse_args("list_ec2_instances", Value::Null).unwrap();
        assert!(args.state.is_none());

        let args: Args = parse_args("list_ec2_instances", json!({"state": "running"})).unwrap();
        assert_eq!(args.state.as_deref(), Some("running"));

        let err = parse_args::<Args>("list_ec2_instances", json!({"state": 5})).err().unwrap();
        assert!(err.to_string().contains("list_ec2_instances"));
    }
}
