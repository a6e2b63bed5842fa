//! AWS documentation research agent.
//!
//! Its tools are whatever the documentation server advertises, so there is
//! no fixed tool list here.

use crate::agents::configurable::ConfigurableAgent;
use crate::llm::LLMClient;
use crate::tools::registry::ToolRegistry;
use crate::types::{AgentName, AppError, Result};
use crate::utils::toml_config::AgentConfig;
use std::sync::Arc;

pub const DEFAULT_WINDOW: usize = 20;

pub const INSTRUCTIONS: &str = r#"You are an AWS research assistant. You answer questions about AWS services, Lambda included, using only the official AWS documentation available through your documentation tools.

For each question:
1. Work out exactly what information is needed.
2. Search the AWS documentation for it.
3. Read the most relevant pages and pull out the facts that answer the question.
4. Keep track of what you have already found in this conversation and build on it.
5. Give a short, direct answer and name the documentation page it came from.

Do not answer from memory when the documentation can be checked. If the documentation does not cover the question, say so plainly."#;

/// Build the researcher with every tool in `docs_tools`
pub fn build(
    config: &AgentConfig,
    llm: Box<dyn LLMClient>,
    docs_tools: ToolRegistry,
) -> Result<ConfigurableAgent> {
    if docs_tools.is_empty() {
        return Err(AppError::Configuration(format!(
            "{} needs at least one documentation tool",
            AgentName::AwsResearcher
        )));
    }

    Ok(ConfigurableAgent::new(
        AgentName::AwsResearcher,
        config,
        INSTRUCTIONS,
        DEFAULT_WINDOW,
        llm,
        Arc::new(docs_tools),
    ))
}
