use crate::agents::registry::AgentRegistry;
use crate::types::AgentName;
use crate::utils::toml_config::RouterConfig;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// A keyword rule mapping queries to one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRule {
    pub name: String,
    pub agent: AgentName,
    pub keywords: Vec<String>,
}

impl RoutingRule {
    pub fn new(name: &str, agent: AgentName, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            agent,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Built-in rules, in priority order.
    ///
    /// Lambda questions go to the researcher even when they also mention EC2.
    pub fn builtin() -> Vec<RoutingRule> {
        vec![
            RoutingRule::new("lambda", AgentName::AwsResearcher, &["lambda"]),
            RoutingRule::new(
                "ec2",
                AgentName::Ec2,
                &[
                    "ec2",
                    "instance",
                    "server",
                    "vm",
                    "virtual machine",
                    "compute",
                    "ami",
                    "security group",
                    "vpc",
                ],
            ),
            RoutingRule::new(
                "invoice",
                AgentName::Invoice,
                &["invoice", "bill", "billing", "payment", "balance due"],
            ),
        ]
    }

    /// First keyword contained in an already lowercased query
    fn first_match(&self, query_lower: &str) -> Option<&str> {
        self.keywords
            .iter()
            .map(String::as_str)
            .find(|keyword| query_lower.contains(keyword))
    }
}

/// Which agent a query goes to and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    pub agent: AgentName,
    /// Rule that matched, `None` when the default agent was chosen
    pub matched_rule: Option<String>,
    pub matched_keyword: Option<String>,
}

impl RoutingDecision {
    pub fn is_default(&self) -> bool {
        self.matched_rule.is_none()
    }
}

/// Failures surfaced to the caller as text, never as `Err`
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("Error: Unable to route query - {0} not available")]
    UnknownAgent(AgentName),

    #[error("Error: {agent} encountered an issue: {detail}")]
    DownstreamFailure { agent: AgentName, detail: String },
}

/// Keyword router over a fixed set of agents.
///
/// Holds no mutable state; concurrent `route` calls are independent.
pub struct Router {
    registry: Arc<AgentRegistry>,
    /// Rules targeting enabled agents only, keywords lowercased
    rules: Vec<RoutingRule>,
    default_agent: AgentName,
}

impl Router {
    pub fn new(registry: Arc<AgentRegistry>, config: &RouterConfig) -> Self {
        let rules = config
            .rules
            .iter()
            .filter(|rule| {
                let enabled = config.is_enabled(rule.agent);
                if !enabled {
                    tracing::debug!(
                        rule = %rule.name,
                        agent = %rule.agent,
                        "Skipping rule for disabled agent"
                    );
                }
                enabled
            })
            .map(|rule| RoutingRule {
                name: rule.name.clone(),
                agent: rule.agent,
                keywords: rule
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();

        Self {
            registry,
            rules,
            default_agent: config.default_agent,
        }
    }

    /// Pick an agent for a query. First matching rule wins.
    pub fn classify(&self, query: &str) -> RoutingDecision {
        let query_lower = query.to_lowercase();

        for rule in &self.rules {
            if let Some(keyword) = rule.first_match(&query_lower) {
                return RoutingDecision {
                    agent: rule.agent,
                    matched_rule: Some(rule.name.clone()),
                    matched_keyword: Some(keyword.to_string()),
                };
            }
        }

        RoutingDecision {
            agent: self.default_agent,
            matched_rule: None,
            matched_keyword: None,
        }
    }

    /// Forward the query, unmodified, to the selected agent.
    ///
    /// Always returns text: either the agent's answer or a rendered
    /// [`RoutingError`].
    pub async fn route(&self, query: &str) -> String {
        let span = tracing::info_span!("route", request_id = %Uuid::new_v4());
        self.route_inner(query).instrument(span).await
    }

    async fn route_inner(&self, query: &str) -> String {
        tracing::info!(query = %query, "Routing query");

        let decision = self.classify(query);
        tracing::info!(
            agent = %decision.agent,
            rule = decision.matched_rule.as_deref().unwrap_or("default"),
            keyword = decision.matched_keyword.as_deref().unwrap_or(""),
            "Routing decision"
        );

        match self.dispatch(decision.agent, query).await {
            Ok(answer) => answer,
            Err(err) => {
                tracing::error!(agent = %decision.agent, error = %err, "Routing failed");
                err.to_string()
            }
        }
    }

    async fn dispatch(&self, agent: AgentName, query: &str) -> Result<String, RoutingError> {
        let handle = self
            .registry
            .get(agent)
            .ok_or(RoutingError::UnknownAgent(agent))?;

        // A panicking agent must not take the session down with it
        match AssertUnwindSafe(handle.invoke(query)).catch_unwind().await {
            Ok(answer) => answer.map_err(|e| RoutingError::DownstreamFailure {
                agent,
                detail: e.to_string(),
            }),
            Err(_) => Err(RoutingError::DownstreamFailure {
                agent,
                detail: "agent panicked".to_string(),
            }),
        }
    }

    /// Agents registered with this router
    pub fn agents(&self) -> Vec<AgentName> {
        self.registry.names()
    }

    /// Active rules in priority order
    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    pub fn default_agent(&self) -> AgentName {
        self.default_agent
    }
}
