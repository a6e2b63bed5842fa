use crate::agents::configurable::ConfigurableAgent;
use crate::llm::LLMClient;
use crate::tools::registry::ToolRegistry;
use crate::types::{AgentName, Result};
use crate::utils::toml_config::AgentConfig;
use std::sync::Arc;

pub const TOOLS: &[&str] = &["list_ec2_instances", "get_ec2_instance_status"];

pub const DEFAULT_WINDOW: usize = 20;

pub const INSTRUCTIONS: &str = r#"You are an EC2 operations assistant answering spoken questions about the user's Amazon EC2 instances.

Use list_ec2_instances to find instances, optionally filtered by state, and get_ec2_instance_status for the health checks of one instance.

- Refer to instances by their Name tag when they have one, and mention the instance id only when it helps tell them apart.
- When listing many instances, give counts per state first, then name at most five.
- If a status check is impaired, say which one and suggest checking the system log or the AWS console.
- You can only read instance information. You cannot start, stop, reboot or modify instances; say so if asked."#;

pub fn build(
    config: &AgentConfig,
    llm: Box<dyn LLMClient>,
    tools: &ToolRegistry,
) -> Result<ConfigurableAgent> {
    Ok(ConfigurableAgent::new(
        AgentName::Ec2,
        config,
        INSTRUCTIONS,
        DEFAULT_WINDOW,
        llm,
        Arc::new(tools.subset(TOOLS)?),
    ))
}
