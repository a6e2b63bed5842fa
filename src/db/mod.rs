//! Invoice persistence.
//!
//! This module provides the invoice model and its storage backends:
//! - **PostgREST**: hosted Postgres (Supabase) over HTTP
//! - **Memory**: process-local map for tests and offline demos
//!
//! Select a backend in `cloudvox.toml`:
//! ```toml
//! [invoice_store]
//! type = "postgrest"   # or "memory"
//! url_env = "SUPABASE_URL"
//! key_env = "SUPABASE_ANON_KEY"
//! schema = "api"
//! ```

pub mod invoice;
pub mod memory;
pub mod postgrest;
pub mod traits;

pub use invoice::{
    Invoice, InvoiceFilter, InvoiceStatus, InvoiceTotals, InvoiceUpdate, NewInvoice,
    calculate_totals,
};
pub use memory::MemoryInvoiceStore;
pub use postgrest::PostgrestInvoiceStore;
pub use traits::{InvoiceStore, InvoiceStoreProvider};
