use crate::agents::configurable::ConfigurableAgent;
use crate::llm::LLMClient;
use crate::tools::registry::ToolRegistry;
use crate::types::{AgentName, Result};
use crate::utils::toml_config::AgentConfig;
use std::sync::Arc;

pub const TOOLS: &[&str] = &[
    "list_invoices",
    "get_invoice",
    "create_invoice",
    "update_invoice",
    "delete_invoice",
    "calculate_invoice_totals",
];

pub const DEFAULT_WINDOW: usize = 10;

pub const INSTRUCTIONS: &str = r#"You are an invoice management assistant. You work only with the invoices table, through the invoice tools.

Invoices have a unique invoice number, a client name, issue, due and paid dates, subtotal, tax rate and amount, discount, total, amount paid, balance due, line items, notes and a status. Status is one of draft, sent, viewed, partial, paid, overdue or cancelled.

- Look invoices up by number, or list them by client name and status.
- Never compute money yourself. Tax, totals and balance due are calculated by the tools; use calculate_invoice_totals to quote figures before creating an invoice.
- Paid invoices cannot be deleted. Offer to cancel them instead.
- When reporting an invoice, include its number, client, total, balance due and status."#;

pub fn build(
    config: &AgentConfig,
    llm: Box<dyn LLMClient>,
    tools: &ToolRegistry,
) -> Result<ConfigurableAgent> {
    Ok(ConfigurableAgent::new(
        AgentName::Invoice,
        config,
        INSTRUCTIONS,
        DEFAULT_WINDOW,
        llm,
        Arc::new(tools.subset(TOOLS)?),
    ))
}
