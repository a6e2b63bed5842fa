//! Agent Registry
//!
//! An immutable map from [`AgentName`] to a live agent handle, built once at
//! startup and shared with the [`Router`](crate::agents::Router).
//!
//! [`AgentRegistry::from_config`] builds every enabled agent together with the
//! tool backends it needs: the AWS CLI for EC2, the MCP documentation server
//! for research and the invoice store for invoices. Backends of disabled
//! agents are never started.

use crate::agents::{Agent, ec2, invoice, researcher};
use crate::db::InvoiceStoreProvider;
use crate::llm::ProviderRegistry;
use crate::tools::ec2::{AwsCliEc2, ec2_tools};
use crate::tools::invoice::invoice_tools;
use crate::tools::mcp::{McpSession, ToolServer, discover_tools};
use crate::tools::registry::ToolRegistry;
use crate::types::{AgentName, Result};
use crate::utils::toml_config::{AgentConfig, CloudvoxConfig, ConfigError};
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only name to agent mapping
pub struct AgentRegistry {
    agents: HashMap<AgentName, Arc<dyn Agent>>,
}

impl AgentRegistry {
    pub fn builder() -> AgentRegistryBuilder {
        AgentRegistryBuilder::default()
    }

    /// Build every enabled agent from configuration.
    ///
    /// Any failure (missing model, unset secret, documentation server that
    /// won't start) aborts startup.
    pub async fn from_config(config: &CloudvoxConfig) -> Result<Self> {
        let providers = ProviderRegistry::from_config(config);
        let mut builder = Self::builder();

        for &name in &config.router.enabled_agents {
            let agent_config = config.get_agent(name).ok_or_else(|| {
                ConfigError::MissingAgentConfig(name, name.config_key().to_string())
            })?;

            let agent = build_agent(name, agent_config, config, &providers).await?;
            tracing::info!(
                agent = %name,
                model = %agent_config.model,
                "Agent ready"
            );
            builder = builder.register(agent);
        }

        Ok(builder.build())
    }

    pub fn get(&self, name: AgentName) -> Option<Arc<dyn Agent>> {
        self.agents.get(&name).cloned()
    }

    pub fn contains(&self, name: AgentName) -> bool {
        self.agents.contains_key(&name)
    }

    /// Registered agent names in canonical order
    pub fn names(&self) -> Vec<AgentName> {
        AgentName::ALL
            .into_iter()
            .filter(|name| self.agents.contains_key(name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

async fn build_agent(
    name: AgentName,
    agent_config: &AgentConfig,
    config: &CloudvoxConfig,
    providers: &ProviderRegistry,
) -> Result<Arc<dyn Agent>> {
    let llm = providers.create_client_for_model(&agent_config.model)?;

    let agent: Arc<dyn Agent> = match name {
        AgentName::Ec2 => {
            let mut tools = ToolRegistry::new();
            tools.register_all(ec2_tools(Arc::new(AwsCliEc2::new(&config.aws))));
            Arc::new(ec2::build(agent_config, llm, &tools)?)
        }
        AgentName::AwsResearcher => {
            let server: Arc<dyn ToolServer> =
                Arc::new(McpSession::connect(&config.docs_server).await?);
            let mut tools = ToolRegistry::new();
            tools.register_all(discover_tools(server).await?);
            Arc::new(researcher::build(agent_config, llm, tools)?)
        }
        AgentName::Invoice => {
            let provider = InvoiceStoreProvider::from_config(&config.invoice_store)?;
            let store = provider.create_store()?;
            tracing::info!(backend = store.backend(), "Invoice store ready");

            let mut tools = ToolRegistry::new();
            tools.register_all(invoice_tools(store));
            Arc::new(invoice::build(agent_config, llm, &tools)?)
        }
    };

    Ok(agent)
}

/// Collects agents before freezing them into an [`AgentRegistry`]
#[derive(Default)]
pub struct AgentRegistryBuilder {
    agents: HashMap<AgentName, Arc<dyn Agent>>,
}

impl AgentRegistryBuilder {
    /// Add an agent, replacing any earlier agent with the same name
    pub fn register(mut self, agent: Arc<dyn Agent>) -> Self {
        self.agents.insert(agent.name(), agent);
        self
    }

    pub fn register_all(self, agents: impl IntoIterator<Item = Arc<dyn Agent>>) -> Self {
        agents.into_iter().fold(self, |builder, agent| builder.register(agent))
    }

    pub fn build(self) -> AgentRegistry {
        AgentRegistry {
            agents: self.agents,
        }
    }
}
