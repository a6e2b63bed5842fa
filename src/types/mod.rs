use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============= Agent Types =============

/// The closed set of agents a query can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AgentName {
    /// EC2 instance status lookups
    Ec2,
    /// AWS documentation research
    AwsResearcher,
    /// Invoice CRUD against the invoice store
    Invoice,
}

impl AgentName {
    /// All variants, in declaration order
    pub const ALL: [AgentName; 3] = [AgentName::Ec2, AgentName::AwsResearcher, AgentName::Invoice];

    /// Canonical name as shown to users and in error strings
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentName::Ec2 => "EC2Agent",
            AgentName::AwsResearcher => "AWSResearcherAgent",
            AgentName::Invoice => "InvoiceAgent",
        }
    }

    /// Key of the `[agents.*]` table configuring this agent
    pub fn config_key(&self) -> &'static str {
        match self {
            AgentName::Ec2 => "ec2",
            AgentName::AwsResearcher => "researcher",
            AgentName::Invoice => "invoice",
        }
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ec2agent" | "ec2" => Ok(AgentName::Ec2),
            "awsresearcheragent" | "researcher" | "aws_researcher" => Ok(AgentName::AwsResearcher),
            "invoiceagent" | "invoice" => Ok(AgentName::Invoice),
            other => Err(AppError::InvalidInput(format!("Unknown agent name: {}", other))),
        }
    }
}

impl TryFrom<String> for AgentName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AgentName> for String {
    fn from(name: AgentName) -> Self {
        name.as_str().to_string()
    }
}

// ============= Tool Types =============

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::utils::toml_config::ConfigError> for AppError {
    fn from(err: crate::utils::toml_config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
