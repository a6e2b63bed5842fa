//! Domain agents and the router that dispatches to them.
//!
//! Every agent is a [`ConfigurableAgent`]: domain instructions, a bounded tool
//! set, an LLM client and a conversation window. The [`router::Router`] picks
//! one agent per query by keyword and never calls an LLM itself.

pub mod configurable;
pub mod ec2;
pub mod invoice;
pub mod registry;
pub mod researcher;
pub mod router;

use crate::types::{AgentName, Result};
use async_trait::async_trait;

// Re-export commonly used types
pub use configurable::ConfigurableAgent;
pub use registry::{AgentRegistry, AgentRegistryBuilder};
pub use router::{Router, RoutingDecision, RoutingError, RoutingRule};

/// Rules shared by every agent, appended after its domain instructions.
pub const CONSENT_INSTRUCTIONS: &str = r#"Operating rules:
- Before any action that creates, changes or deletes data, state exactly what you will do and wait for the user to say yes. Never assume consent from an earlier turn.
- If the user declines or is unsure, do nothing and say so.
- Read-only lookups need no confirmation.
- Your replies are read aloud. Use short plain sentences, no markdown, tables or code blocks, and stay under 800 characters.
- Only answer questions within your domain. For anything else, say you can't help with that."#;

/// Join domain instructions and the shared operating rules
pub fn compose_system_prompt(instructions: &str) -> String {
    format!("{}\n\n{}", instructions.trim(), CONSENT_INSTRUCTIONS)
}

/// Base trait for all agents
#[async_trait]
pub trait Agent: Send + Sync {
    /// Answer a query, using the agent's tools and conversation memory
    async fn invoke(&self, query: &str) -> Result<String>;

    /// Which agent this is
    fn name(&self) -> AgentName;

    /// Get the agent's system prompt
    fn system_prompt(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_system_prompt() {
        let prompt = compose_system_prompt("  You manage invoices.\n");
        assert!(prompt.starts_with("You manage invoices.\n\nOperating rules:"));
        assert!(prompt.contains("800 characters"));
    }
}
