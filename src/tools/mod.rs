//! Tools available to the domain agents
//!
//! Every capability an agent has beyond text generation is a [`Tool`]:
//!
//! - [`ec2`](crate::tools::ec2) - EC2 instance listing and status checks via the AWS CLI
//! - [`invoice`](crate::tools::invoice) - Invoice CRUD and totals over an invoice store
//! - [`mcp`](crate::tools::mcp) - Documentation tools proxied from an external MCP server
//! - [`registry`](crate::tools::registry) - Tool registration, lookup and execution
//!
//! # Tool Registry
//!
//! Agents never see the full registry. Each one receives a
//! [`subset`](ToolRegistry::subset) holding only its own tools:
//! ```ignore
//! let invoice_tools = registry.subset(&["get_invoice", "list_invoices"])?;
//! let result = invoice_tools.execute("get_invoice", json!({"invoice_number": "INV-001"})).await?;
//! ```

/// EC2 tools and the `Ec2Api` seam.
pub mod ec2;
/// Invoice management tools.
pub mod invoice;
/// MCP client tools for the documentation server.
pub mod mcp;
/// Tool registry for managing available tools.
pub mod registry;

pub use registry::{Tool, ToolRegistry};
