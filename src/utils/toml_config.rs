//! TOML-based configuration for cloudvox
//!
//! This module provides declarative configuration for providers, models, agents,
//! routing rules, the invoice store and the documentation tool server via a TOML
//! file (`cloudvox.toml`).
//!
//! Secrets are never written into the file. Instead the file names the
//! environment variable holding each secret, and [`CloudvoxConfig::validate`]
//! checks that every referenced variable is set. A configuration that fails
//! validation must stop the process before any agent is built.

use crate::agents::router::RoutingRule;
use crate::types::AgentName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure loaded from cloudvox.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudvoxConfig {
    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub aws: AwsConfig,

    /// Named LLM provider configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Named model configurations that reference providers
    #[serde(default)]
    pub models: HashMap<String, ModelConfig>,

    /// Agent configurations keyed by `ec2`, `researcher` or `invoice`
    #[serde(default)]
    pub agents: HashMap<String, AgentConfig>,

    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub invoice_store: InvoiceStoreConfig,

    #[serde(default)]
    pub docs_server: DocsServerConfig,
}

// ============= Application Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human-readable format
    #[serde(default)]
    pub json_logs: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

// ============= AWS Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Named profile passed to the AWS CLI (`--profile`)
    #[serde(default)]
    pub profile: Option<String>,

    #[serde(default = "default_region")]
    pub region: String,

    /// Path to the `aws` executable
    #[serde(default = "default_cli_path")]
    pub cli_path: String,

    #[serde(default = "default_aws_timeout")]
    pub timeout_secs: u64,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_cli_path() -> String {
    "aws".to_string()
}

fn default_aws_timeout() -> u64 {
    30
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            profile: None,
            region: default_region(),
            cli_path: default_cli_path(),
            timeout_secs: default_aws_timeout(),
        }
    }
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Any OpenAI-compatible chat completions endpoint
    OpenAI {
        /// Environment variable containing API key
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
        default_model: String,
    },
    /// Local Ollama server, spoken to through its OpenAI-compatible `/v1` API
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        default_model: String,
    },
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

// ============= Model Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Reference to a provider name defined in [providers]
    pub provider: String,

    /// Model name/identifier to use with the provider
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_model_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f32 {
    0.3
}

fn default_model_max_tokens() -> u32 {
    1024
}

fn default_request_timeout() -> u64 {
    120
}

// ============= Agent Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Reference to a model name defined in [models]
    pub model: String,

    /// Replaces the built-in domain instructions when set
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Number of prior messages kept as conversation context. Exchanges are
    /// kept or dropped whole, so 0 turns memory off and 1 is rejected.
    /// Falls back to the agent's built-in window size when unset.
    #[serde(default)]
    pub conversation_window: Option<usize>,

    /// Maximum tool calling iterations
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,

    /// Whether to execute tool calls of one iteration in parallel
    #[serde(default = "default_true")]
    pub parallel_tools: bool,

    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,
}

fn default_max_tool_iterations() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_tool_timeout() -> u64 {
    30
}

impl AgentConfig {
    /// Agent config with defaults for everything except the model
    pub fn for_model(model: &str) -> Self {
        Self {
            model: model.to_string(),
            system_prompt: None,
            conversation_window: None,
            max_tool_iterations: default_max_tool_iterations(),
            parallel_tools: true,
            tool_timeout_secs: default_tool_timeout(),
        }
    }

    /// Reject limits that would make every query fail
    fn validate_limits(&self, key: &str) -> Result<(), ConfigError> {
        if self.max_tool_iterations == 0 {
            return Err(ConfigError::ValidationError(format!(
                "agents.{}.max_tool_iterations must be at least 1",
                key
            )));
        }
        if self.tool_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(format!(
                "agents.{}.tool_timeout_secs must be at least 1",
                key
            )));
        }
        // The window holds user/assistant pairs; one message can never keep a pair
        if self.conversation_window == Some(1) {
            return Err(ConfigError::ValidationError(format!(
                "agents.{}.conversation_window must be 0 (off) or at least 2",
                key
            )));
        }
        Ok(())
    }
}

// ============= Router Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Agents that can be selected. Rules targeting other agents are skipped.
    #[serde(default = "default_enabled_agents")]
    pub enabled_agents: Vec<AgentName>,

    /// Agent chosen when no rule matches
    #[serde(default = "default_agent")]
    pub default_agent: AgentName,

    /// Ordered keyword rules; the first rule with a matching keyword wins
    #[serde(default = "RoutingRule::builtin")]
    pub rules: Vec<RoutingRule>,
}

fn default_enabled_agents() -> Vec<AgentName> {
    vec![AgentName::Ec2, AgentName::AwsResearcher]
}

fn default_agent() -> AgentName {
    AgentName::AwsResearcher
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            enabled_agents: default_enabled_agents(),
            default_agent: default_agent(),
            rules: RoutingRule::builtin(),
        }
    }
}

impl RouterConfig {
    /// Check whether an agent is in the enabled set
    pub fn is_enabled(&self, agent: AgentName) -> bool {
        self.enabled_agents.contains(&agent)
    }
}

// ============= Invoice Store Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InvoiceStoreConfig {
    /// Hosted Postgres exposed through PostgREST (Supabase)
    Postgrest {
        /// Environment variable holding the project URL
        #[serde(default = "default_postgrest_url_env")]
        url_env: String,
        /// Environment variable holding the API key
        #[serde(default = "default_postgrest_key_env")]
        key_env: String,
        #[serde(default = "default_postgrest_schema")]
        schema: String,
        #[serde(default = "default_invoice_table")]
        table: String,
        #[serde(default = "default_postgrest_timeout")]
        timeout_secs: u64,
    },
    /// Process-local store, contents are lost on exit
    Memory,
}

fn default_postgrest_url_env() -> String {
    "SUPABASE_URL".to_string()
}

fn default_postgrest_key_env() -> String {
    "SUPABASE_ANON_KEY".to_string()
}

fn default_postgrest_schema() -> String {
    "api".to_string()
}

fn default_invoice_table() -> String {
    "invoices".to_string()
}

fn default_postgrest_timeout() -> u64 {
    10
}

impl Default for InvoiceStoreConfig {
    fn default() -> Self {
        InvoiceStoreConfig::Memory
    }
}

// ============= Documentation Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsServerConfig {
    #[serde(default = "default_docs_command")]
    pub command: String,

    #[serde(default = "default_docs_args")]
    pub args: Vec<String>,

    /// Extra environment variables for the server process
    #[serde(default)]
    pub env: HashMap<String, String>,

    #[serde(default = "default_docs_startup_timeout")]
    pub startup_timeout_secs: u64,
}

fn default_docs_command() -> String {
    "uvx".to_string()
}

fn default_docs_args() -> Vec<String> {
    vec!["awslabs.aws-documentation-mcp-server@latest".to_string()]
}

fn default_docs_startup_timeout() -> u64 {
    60
}

impl Default for DocsServerConfig {
    fn default() -> Self {
        Self {
            command: default_docs_command(),
            args: default_docs_args(),
            env: HashMap::new(),
            startup_timeout_secs: default_docs_startup_timeout(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Configuration warnings that don't prevent operation but may indicate issues
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub kind: ConfigWarningKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarningKind {
    UnusedProvider,
    UnusedModel,
    DisabledAgent,
    InactiveRule,
}

impl std::fmt::Display for ConfigWarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            ConfigWarningKind::UnusedProvider => "unused provider",
            ConfigWarningKind::UnusedModel => "unused model",
            ConfigWarningKind::DisabledAgent => "disabled agent",
            ConfigWarningKind::InactiveRule => "inactive rule",
        };
        f.write_str(tag)
    }
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Provider '{0}' referenced by model '{1}' does not exist")]
    MissingProvider(String, String),

    #[error("Model '{0}' referenced by agent '{1}' does not exist")]
    MissingModel(String, String),

    #[error("Agent '{0}' is enabled but has no [agents.{1}] section")]
    MissingAgentConfig(AgentName, String),
}

impl CloudvoxConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;

        config.validate()?;

        Ok(config)
    }

    /// Read and parse a TOML file without validating it
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse TOML content without validating it
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the configuration for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        for provider in self.providers.values() {
            if let ProviderConfig::OpenAI { api_key_env, .. } = provider {
                self.validate_env_var(api_key_env)?;
            }
        }

        // Validate model -> provider references
        for (model_name, model_config) in &self.models {
            if !self.providers.contains_key(&model_config.provider) {
                return Err(ConfigError::MissingProvider(
                    model_config.provider.clone(),
                    model_name.clone(),
                ));
            }
        }

        // Validate agent -> model references
        for (agent_key, agent_config) in &self.agents {
            if agent_key.parse::<AgentName>().is_err() {
                return Err(ConfigError::ValidationError(format!(
                    "Unknown agent section [agents.{}]; expected ec2, researcher or invoice",
                    agent_key
                )));
            }
            if !self.models.contains_key(&agent_config.model) {
                return Err(ConfigError::MissingModel(
                    agent_config.model.clone(),
                    agent_key.clone(),
                ));
            }
            agent_config.validate_limits(agent_key)?;
        }

        if self.router.enabled_agents.is_empty() {
            return Err(ConfigError::ValidationError(
                "router.enabled_agents must name at least one agent".to_string(),
            ));
        }

        for agent in &self.router.enabled_agents {
            if self.get_agent(*agent).is_none() {
                return Err(ConfigError::MissingAgentConfig(
                    *agent,
                    agent.config_key().to_string(),
                ));
            }
        }

        if !self.router.is_enabled(self.router.default_agent) {
            return Err(ConfigError::ValidationError(format!(
                "router.default_agent '{}' is not in router.enabled_agents",
                self.router.default_agent
            )));
        }

        for rule in &self.router.rules {
            if rule.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(ConfigError::ValidationError(format!(
                    "Routing rule '{}' has no keywords",
                    rule.name
                )));
            }
        }

        if self.router.is_enabled(AgentName::Invoice)
            && let InvoiceStoreConfig::Postgrest {
                url_env, key_env, ..
            } = &self.invoice_store
        {
            self.validate_env_var(url_env)?;
            self.validate_env_var(key_env)?;
        }

        Ok(())
    }

    /// Validate configuration with warnings for unused items
    ///
    /// Returns Ok with warnings, or Err if validation fails
    pub fn validate_with_warnings(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        self.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(self.check_unused_providers());
        warnings.extend(self.check_unused_models());
        warnings.extend(self.check_disabled_agents());
        warnings.extend(self.check_inactive_rules());

        Ok(warnings)
    }

    /// Check for providers that aren't referenced by any model
    fn check_unused_providers(&self) -> Vec<ConfigWarning> {
        use std::collections::HashSet;

        let referenced: HashSet<_> = self.models.values().map(|m| m.provider.as_str()).collect();

        self.providers
            .keys()
            .filter(|name| !referenced.contains(name.as_str()))
            .map(|name| ConfigWarning {
                kind: ConfigWarningKind::UnusedProvider,
                message: format!(
                    "Provider '{}' is defined but not referenced by any model",
                    name
                ),
            })
            .collect()
    }

    /// Check for models that aren't referenced by any agent
    fn check_unused_models(&self) -> Vec<ConfigWarning> {
        use std::collections::HashSet;

        let referenced: HashSet<_> = self.agents.values().map(|a| a.model.as_str()).collect();

        self.models
            .keys()
            .filter(|name| !referenced.contains(name.as_str()))
            .map(|name| ConfigWarning {
                kind: ConfigWarningKind::UnusedModel,
                message: format!(
                    "Model '{}' is defined but not referenced by any agent",
                    name
                ),
            })
            .collect()
    }

    /// Check for agent sections that the router will never select
    fn check_disabled_agents(&self) -> Vec<ConfigWarning> {
        self.agents
            .keys()
            .filter_map(|key| key.parse::<AgentName>().ok())
            .filter(|agent| !self.router.is_enabled(*agent))
            .map(|agent| ConfigWarning {
                kind: ConfigWarningKind::DisabledAgent,
                message: format!(
                    "Agent '{}' is configured but not in router.enabled_agents",
                    agent
                ),
            })
            .collect()
    }

    /// Check for rules whose target agent is disabled
    fn check_inactive_rules(&self) -> Vec<ConfigWarning> {
        self.router
            .rules
            .iter()
            .filter(|rule| !self.router.is_enabled(rule.agent))
            .map(|rule| ConfigWarning {
                kind: ConfigWarningKind::InactiveRule,
                message: format!(
                    "Routing rule '{}' targets disabled agent '{}' and will be skipped",
                    rule.name, rule.agent
                ),
            })
            .collect()
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        resolve_env(name).map(|_| ())
    }

    /// Get provider by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Get model by name
    pub fn get_model(&self, name: &str) -> Option<&ModelConfig> {
        self.models.get(name)
    }

    /// Get the configuration section of an agent
    pub fn get_agent(&self, agent: AgentName) -> Option<&AgentConfig> {
        self.agents.get(agent.config_key())
    }
}

/// Value of an environment variable named in the config; empty counts as unset
pub fn resolve_env(name: &str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvVar(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> String {
        r#"
[app]
log_level = "debug"

[aws]
profile = "ops"
region = "eu-west-1"

[providers.ollama-local]
type = "ollama"
base_url = "http://localhost:11434"
default_model = "qwen2.5:7b"

[models.default]
provider = "ollama-local"
model = "qwen2.5:7b"
temperature = 0.2
max_tokens = 512

[agents.ec2]
model = "default"

[agents.researcher]
model = "default"
conversation_window = 6
"#
        .to_string()
    }

    #[test]
    fn test_parse_config() {
        let config = CloudvoxConfig::parse(&create_test_config()).expect("Failed to parse config");

        assert_eq!(config.app.log_level, "debug");
        assert_eq!(config.aws.profile.as_deref(), Some("ops"));
        assert_eq!(config.aws.region, "eu-west-1");
        assert!(config.providers.contains_key("ollama-local"));
        assert!(config.models.contains_key("default"));
        assert!(config.get_agent(AgentName::Ec2).is_some());
        assert_eq!(
            config
                .get_agent(AgentName::AwsResearcher)
                .and_then(|a| a.conversation_window),
            Some(6)
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = CloudvoxConfig::parse("").unwrap();

        assert_eq!(config.app.log_level, "info");
        assert!(!config.app.json_logs);
        assert_eq!(config.aws.region, "us-east-1");
        assert_eq!(config.aws.cli_path, "aws");
        assert_eq!(
            config.router.enabled_agents,
            vec![AgentName::Ec2, AgentName::AwsResearcher]
        );
        assert_eq!(config.router.default_agent, AgentName::AwsResearcher);
        assert_eq!(config.router.rules.len(), 3);
        assert!(matches!(config.invoice_store, InvoiceStoreConfig::Memory));
        assert_eq!(config.docs_server.command, "uvx");
    }

    #[test]
    fn test_validation_missing_provider() {
        let content = r#"
[models.test]
provider = "nonexistent"
model = "test"
"#;

        let config = CloudvoxConfig::parse(content).unwrap();
        let result = config.validate();

        assert!(matches!(result, Err(ConfigError::MissingProvider(_, _))));
    }

    #[test]
    fn test_validation_missing_model() {
        let content = r#"
[providers.test]
type = "ollama"
default_model = "qwen2.5:7b"
[agents.ec2]
model = "nonexistent"
"#;

        let config = CloudvoxConfig::parse(content).unwrap();
        let result = config.validate();

        assert!(matches!(result, Err(ConfigError::MissingModel(_, _))));
    }

    #[test]
    fn test_validation_enabled_agent_without_section() {
        let content = r#"
[providers.test]
type = "ollama"
default_model = "qwen2.5:7b"
[models.default]
provider = "test"
model = "qwen2.5:7b"
[agents.ec2]
model = "default"
"#;

        let config = CloudvoxConfig::parse(content).unwrap();
        let result = config.validate();

        assert!(matches!(
            result,
            Err(ConfigError::MissingAgentConfig(AgentName::AwsResearcher, _))
        ));
    }

    #[test]
    fn test_validation_default_agent_must_be_enabled() {
        let content = format!(
            "{}\n[router]\nenabled_agents = [\"EC2Agent\"]\ndefault_agent = \"AWSResearcherAgent\"\n",
            create_test_config()
        );

        let config = CloudvoxConfig::parse(&content).unwrap();
        let result = config.validate();

        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validation_unknown_agent_section() {
        let content = format!("{}\n[agents.backup]\nmodel = \"default\"\n", create_test_config());

        let config = CloudvoxConfig::parse(&content).unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(msg)) if msg.contains("backup")
        ));
    }

    #[test]
    fn test_validation_missing_openai_key() {
        let content = r#"
[providers.openai]
type = "openai"
api_key_env = "CLOUDVOX_TEST_UNSET_OPENAI_KEY"
default_model = "gpt-4o-mini"
"#;

        let config = CloudvoxConfig::parse(content).unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingEnvVar(name)) if name == "CLOUDVOX_TEST_UNSET_OPENAI_KEY"
        ));
    }

    #[test]
    fn test_validation_postgrest_env_when_invoice_enabled() {
        let content = format!(
            r#"{}
[agents.invoice]
model = "default"

[router]
enabled_agents = ["ec2", "researcher", "invoice"]

[invoice_store]
type = "postgrest"
url_env = "CLOUDVOX_TEST_UNSET_SUPABASE_URL"
key_env = "CLOUDVOX_TEST_UNSET_SUPABASE_KEY"
"#,
            create_test_config()
        );

        let config = CloudvoxConfig::parse(&content).unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingEnvVar(name)) if name == "CLOUDVOX_TEST_UNSET_SUPABASE_URL"
        ));
    }

    #[test]
    fn test_custom_rules_replace_builtin() {
        let content = format!(
            r#"{}
[[router.rules]]
name = "docs"
agent = "researcher"
keywords = ["documentation", "docs"]
"#,
            create_test_config()
        );

        let config = CloudvoxConfig::parse(&content).unwrap();

        assert_eq!(config.router.rules.len(), 1);
        assert_eq!(config.router.rules[0].agent, AgentName::AwsResearcher);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unused_provider_warning() {
        let content = format!(
            "{}\n[providers.unused]\ntype = \"ollama\"\ndefault_model = \"llama3.2\"\n",
            create_test_config()
        );

        let config = CloudvoxConfig::parse(&content).unwrap();
        let warnings = config.validate_with_warnings().unwrap();

        assert!(
            warnings.iter().any(
                |w| w.kind == ConfigWarningKind::UnusedProvider && w.message.contains("unused")
            )
        );
    }

    #[test]
    fn test_disabled_agent_and_inactive_rule_warnings() {
        let content = format!("{}\n[agents.invoice]\nmodel = \"default\"\n", create_test_config());

        let config = CloudvoxConfig::parse(&content).unwrap();
        let warnings = config.validate_with_warnings().unwrap();

        assert!(warnings.iter().any(|w| w.kind == ConfigWarningKind::DisabledAgent
            && w.message.contains("InvoiceAgent")));
        assert!(warnings.iter().any(|w| w.kind == ConfigWarningKind::InactiveRule
            && w.message.contains("invoice")));
    }

    #[test]
    fn test_no_warnings_for_fully_connected_config() {
        let content = format!(
            "{}\n[router]\nenabled_agents = [\"ec2\", \"researcher\"]\n\n[[router.rules]]\nname = \"ec2\"\nagent = \"ec2\"\nkeywords = [\"ec2\"]\n",
            create_test_config()
        );

        let config = CloudvoxConfig::parse(&content).unwrap();
        let warnings = config.validate_with_warnings().unwrap();

        assert!(
            warnings.is_empty(),
            "Expected no warnings but got: {:?}",
            warnings
        );
    }

    fn config_with_ec2_setting(setting: &str) -> CloudvoxConfig {
        let content = create_test_config().replace(
            "[agents.ec2]\nmodel = \"default\"\n",
            &format!("[agents.ec2]\nmodel = \"default\"\n{}\n", setting),
        );
        CloudvoxConfig::parse(&content).unwrap()
    }

    #[test]
    fn test_validation_rejects_zero_tool_iterations() {
        let config = config_with_ec2_setting("max_tool_iterations = 0");

        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(msg)) if msg.contains("agents.ec2.max_tool_iterations")
        ));
    }

    #[test]
    fn test_validation_rejects_zero_tool_timeout() {
        let config = config_with_ec2_setting("tool_timeout_secs = 0");

        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(msg)) if msg.contains("agents.ec2.tool_timeout_secs")
        ));
    }

    #[test]
    fn test_validation_rejects_single_message_window() {
        let config = config_with_ec2_setting("conversation_window = 1");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(msg)) if msg.contains("conversation_window")
        ));

        assert!(config_with_ec2_setting("conversation_window = 0").validate().is_ok());
        assert!(config_with_ec2_setting("conversation_window = 2").validate().is_ok());
    }

    #[test]
    fn test_warning_kind_labels() {
        assert_eq!(ConfigWarningKind::UnusedProvider.to_string(), "unused provider");
        assert_eq!(ConfigWarningKind::UnusedModel.to_string(), "unused model");
        assert_eq!(ConfigWarningKind::DisabledAgent.to_string(), "disabled agent");
        assert_eq!(ConfigWarningKind::InactiveRule.to_string(), "inactive rule");
    }

    #[test]
    fn test_resolve_env_treats_empty_as_unset() {
        assert!(matches!(
            resolve_env("CLOUDVOX_TEST_NEVER_SET_VAR"),
            Err(ConfigError::MissingEnvVar(name)) if name == "CLOUDVOX_TEST_NEVER_SET_VAR"
        ));
        assert_eq!(resolve_env("PATH").ok(), std::env::var("PATH").ok().filter(|p| !p.is_empty()));
    }
}
