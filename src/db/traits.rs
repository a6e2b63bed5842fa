//! Invoice store abstraction
//!
//! This module provides the `InvoiceStore` trait that abstracts over the
//! invoice backends (hosted Postgres through PostgREST, in-process memory).
//!
//! # Example
//!
//! ```rust,ignore
//! use cloudvox::db::InvoiceStoreProvider;
//!
//! // Ephemeral store for tests and offline demos
//! let store = InvoiceStoreProvider::Memory.create_store()?;
//!
//! // Hosted store, credentials read from the environment
//! let store = InvoiceStoreProvider::from_config(&config.invoice_store)?.create_store()?;
//! ```

use super::invoice::{Invoice, InvoiceFilter};
use crate::types::Result;
use crate::utils::toml_config::{InvoiceStoreConfig, resolve_env};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Invoice store provider configuration, with secrets resolved
#[derive(Debug, Clone, Default)]
pub enum InvoiceStoreProvider {
    /// In-process map (ephemeral, lost on restart)
    #[default]
    Memory,
    /// PostgREST endpoint of a hosted Postgres project
    Postgrest {
        /// Project URL, e.g. `https://xyz.supabase.co`
        url: String,
        api_key: String,
        schema: String,
        table: String,
        timeout: Duration,
    },
}

impl InvoiceStoreProvider {
    /// Resolve a provider from the `[invoice_store]` table
    pub fn from_config(config: &InvoiceStoreConfig) -> Result<Self> {
        match config {
            InvoiceStoreConfig::Memory => Ok(InvoiceStoreProvider::Memory),
            InvoiceStoreConfig::Postgrest {
                url_env,
                key_env,
                schema,
                table,
                timeout_secs,
            } => Ok(InvoiceStoreProvider::Postgrest {
                url: resolve_env(url_env)?,
                api_key: resolve_env(key_env)?,
                schema: schema.clone(),
                table: table.clone(),
                timeout: Duration::from_secs(*timeout_secs),
            }),
        }
    }

    /// Create a store from this provider configuration
    pub fn create_store(&self) -> Result<Arc<dyn InvoiceStore>> {
        match self {
            InvoiceStoreProvider::Memory => Ok(Arc::new(super::memory::MemoryInvoiceStore::new())),
            InvoiceStoreProvider::Postgrest {
                url,
                api_key,
                schema,
                table,
                timeout,
            } => Ok(Arc::new(super::postgrest::PostgrestInvoiceStore::new(
                url, api_key, schema, table, *timeout,
            )?)),
        }
    }
}

/// Abstract trait for invoice persistence
///
/// Invoices are addressed by their unique `invoice_number`. Implementations
/// store rows as given; amount and status rules live in [`super::invoice`].
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Invoices matching the filter, newest issue date first, capped at the filter limit
    async fn list(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>>;

    async fn get(&self, invoice_number: &str) -> Result<Option<Invoice>>;

    /// Insert a new invoice; fails if the number is taken
    async fn create(&self, invoice: &Invoice) -> Result<Invoice>;

    /// Replace the stored invoice with the same number
    async fn update(&self, invoice: &Invoice) -> Result<Invoice>;

    /// Returns whether a row was deleted
    async fn delete(&self, invoice_number: &str) -> Result<bool>;

    /// Short backend name for logs and the CLI
    fn backend(&self) -> &'static str;
}
