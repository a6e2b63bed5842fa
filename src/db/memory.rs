use super::invoice::{Invoice, InvoiceFilter};
use super::traits::InvoiceStore;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Process-local invoice store keyed by invoice number
pub struct MemoryInvoiceStore {
    invoices: RwLock<BTreeMap<String, Invoice>>,
}

impl MemoryInvoiceStore {
    pub fn new() -> Self {
        Self {
            invoices: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.invoices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.invoices.read().is_empty()
    }
}

impl Default for MemoryInvoiceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InvoiceStore for MemoryInvoiceStore {
    async fn list(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
        let mut matching: Vec<Invoice> = self
            .invoices
            .read()
            .values()
            .filter(|invoice| filter.matches(invoice))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            b.issue_date
                .cmp(&a.issue_date)
                .then_with(|| b.invoice_number.cmp(&a.invoice_number))
        });
        matching.truncate(filter.effective_limit());
        Ok(matching)
    }

    async fn get(&self, invoice_number: &str) -> Result<Option<Invoice>> {
        Ok(self.invoices.read().get(invoice_number).cloned())
    }

    async fn create(&self, invoice: &Invoice) -> Result<Invoice> {
        let mut invoices = self.invoices.write();
        if invoices.contains_key(&invoice.invoice_number) {
            return Err(AppError::InvalidInput(format!(
                "Invoice {} already exists",
                invoice.invoice_number
            )));
        }

        let mut stored = invoice.clone();
        stored.id = Some(Uuid::new_v4());
        invoices.insert(stored.invoice_number.clone(), stored.clone());
        Ok(stored)
    }

    async fn update(&self, invoice: &Invoice) -> Result<Invoice> {
        let mut invoices = self.invoices.write();
        let existing = invoices
            .get_mut(&invoice.invoice_number)
            .ok_or_else(|| {
                AppError::NotFound(format!("Invoice {} not found", invoice.invoice_number))
            })?;

        let id = existing.id;
        *existing = invoice.clone();
        existing.id = id;
        Ok(existing.clone())
    }

    async fn delete(&self, invoice_number: &str) -> Result<bool> {
        Ok(self.invoices.write().remove(invoice_number).is_some())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
