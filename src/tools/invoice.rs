//! Invoice management tools over an [`InvoiceStore`].

use crate::db::invoice::{
    Invoice, InvoiceFilter, InvoiceStatus, InvoiceUpdate, NewInvoice, calculate_totals,
};
use crate::db::traits::InvoiceStore;
use crate::tools::registry::{Tool, parse_args};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn status_values() -> Vec<&'static str> {
    InvoiceStatus::ALL.iter().map(|s| s.as_str()).collect()
}

fn to_json(invoice: &Invoice) -> Result<Value> {
    serde_json::to_value(invoice).map_err(|e| AppError::Internal(e.to_string()))
}

#[derive(Deserialize)]
struct InvoiceNumberArgs {
    invoice_number: String,
}

async fn fetch(store: &dyn InvoiceStore, invoice_number: &str) -> Result<Invoice> {
    store
        .get(invoice_number.trim())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Invoice {} not found", invoice_number.trim())))
}

// ============= list_invoices =============

pub struct ListInvoicesTool {
    store: Arc<dyn InvoiceStore>,
}

impl ListInvoicesTool {
    pub fn new(store: Arc<dyn InvoiceStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ListInvoicesTool {
    fn name(&self) -> &str {
        "list_invoices"
    }

    fn description(&self) -> &str {
        "List invoices, newest first. Optionally filter by client name (partial match), status, \
         issue date range and due date (due_before finds invoices that are overdue by that date)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "client_name": { "type": "string", "description": "Part of the client name" },
                "status": { "type": "string", "enum": status_values() },
                "issued_from": { "type": "string", "format": "date", "description": "Earliest issue date, YYYY-MM-DD" },
                "issued_to": { "type": "string", "format": "date", "description": "Latest issue date, YYYY-MM-DD" },
                "due_before": { "type": "string", "format": "date", "description": "Due strictly before this date, YYYY-MM-DD" },
                "limit": { "type": "integer", "minimum": 1, "maximum": 100 }
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let filter: InvoiceFilter = parse_args(self.name(), args)?;
        let invoices = self.store.list(&filter).await?;

        let total_outstanding: f64 = invoices.iter().map(|i| i.balance_due).sum();
        let rows: Vec<Value> = invoices
            .iter()
            .map(|i| {
                json!({
                    "invoice_number": i.invoice_number,
                    "client_name": i.client_name,
                    "issue_date": i.issue_date,
                    "due_date": i.due_date,
                    "total_amount": i.total_amount,
                    "balance_due": i.balance_due,
                    "status": i.status,
                })
            })
            .collect();

        Ok(json!({
            "count": rows.len(),
            "total_balance_due": crate::db::invoice::round_cents(total_outstanding),
            "invoices": rows,
        }))
    }
}

// ============= get_invoice =============

pub struct GetInvoiceTool {
    store: Arc<dyn InvoiceStore>,
}

impl GetInvoiceTool {
    pub fn new(store: Arc<dyn InvoiceStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for GetInvoiceTool {
    fn name(&self) -> &str {
        "get_invoice"
    }

    fn description(&self) -> &str {
        "Get all details of one invoice by its invoice number"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "invoice_number": { "type": "string", "description": "e.g. INV-001" }
            },
            "required": ["invoice_number"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: InvoiceNumberArgs = parse_args(self.name(), args)?;
        let invoice = fetch(self.store.as_ref(), &args.invoice_number).await?;
        to_json(&invoice)
    }
}

// ============= create_invoice =============

pub struct CreateInvoiceTool {
    store: Arc<dyn InvoiceStore>,
}

impl CreateInvoiceTool {
    pub fn new(store: Arc<dyn InvoiceStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CreateInvoiceTool {
    fn name(&self) -> &str {
        "create_invoice"
    }

    fn description(&self) -> &str {
        "Create a new draft invoice. Tax and totals are calculated automatically. \
         Only call this after the user has confirmed the details."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "invoice_number": { "type": "string", "description": "Unique number, e.g. INV-001" },
                "client_name": { "type": "string" },
                "client_email": { "type": "string" },
                "subtotal": { "type": "number", "minimum": 0 },
                "tax_rate": { "type": "number", "minimum": 0, "maximum": 1, "description": "0.08 for 8%" },
                "discount_amount": { "type": "number", "minimum": 0 },
                "issue_date": { "type": "string", "format": "date" },
                "due_date": { "type": "string", "format": "date" },
                "notes": { "type": "string" },
                "line_items": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "description": { "type": "string" },
                            "quantity": { "type": "number" },
                            "unit_price": { "type": "number" }
                        }
                    }
                }
            },
            "required": ["invoice_number", "client_name", "subtotal"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let new_invoice: NewInvoice = parse_args(self.name(), args)?;
        let invoice = new_invoice.into_invoice(today())?;

        if self.store.get(&invoice.invoice_number).await?.is_some() {
            return Err(AppError::InvalidInput(format!(
                "Invoice {} already exists",
                invoice.invoice_number
            )));
        }

        let created = self.store.create(&invoice).await?;
        tracing::info!(invoice_number = %created.invoice_number, "Invoice created");

        Ok(json!({
            "message": format!(
                "Invoice created: {} for {}, total ${:.2}",
                created.invoice_number, created.client_name, created.total_amount
            ),
            "invoice": to_json(&created)?,
        }))
    }
}

// ============= update_invoice =============

pub struct UpdateInvoiceTool {
    store: Arc<dyn InvoiceStore>,
}

impl UpdateInvoiceTool {
    pub fn new(store: Arc<dyn InvoiceStore>) -> Self {
        Self { store }
    }
}

#[derive(Deserialize)]
struct UpdateInvoiceArgs {
    invoice_number: String,
    #[serde(flatten)]
    update: InvoiceUpdate,
}

#[async_trait]
impl Tool for UpdateInvoiceTool {
    fn name(&self) -> &str {
        "update_invoice"
    }

    fn description(&self) -> &str {
        "Update an invoice: record a payment, change status, dates, notes or amounts. \
         Totals and balance are recalculated. Recording a full payment marks it paid. \
         Only call this after the user has confirmed the change."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "invoice_number": { "type": "string" },
                "status": { "type": "string", "enum": status_values() },
                "amount_paid": { "type": "number", "minimum": 0, "description": "Total paid so far" },
                "due_date": { "type": "string", "format": "date" },
                "paid_date": { "type": "string", "format": "date" },
                "notes": { "type": "string" },
                "subtotal": { "type": "number", "minimum": 0 },
                "tax_rate": { "type": "number", "minimum": 0, "maximum": 1 },
                "discount_amount": { "type": "number", "minimum": 0 }
            },
            "required": ["invoice_number"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: UpdateInvoiceArgs = parse_args(self.name(), args)?;
        let current = fetch(self.store.as_ref(), &args.invoice_number).await?;

        let updated = args.update.apply(&current, today())?;
        let stored = self.store.update(&updated).await?;
        tracing::info!(
            invoice_number = %stored.invoice_number,
            status = %stored.status,
            "Invoice updated"
        );

        Ok(json!({
            "message": format!("Invoice updated: {}", stored.summary()),
            "invoice": to_json(&stored)?,
        }))
    }
}

// ============= delete_invoice =============

pub struct DeleteInvoiceTool {
    store: Arc<dyn InvoiceStore>,
}

impl DeleteInvoiceTool {
    pub fn new(store: Arc<dyn InvoiceStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for DeleteInvoiceTool {
    fn name(&self) -> &str {
        "delete_invoice"
    }

    fn description(&self) -> &str {
        "Permanently delete an invoice. Paid invoices cannot be deleted. \
         Only call this after the user has explicitly confirmed the deletion."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "invoice_number": { "type": "string" }
            },
            "required": ["invoice_number"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: InvoiceNumberArgs = parse_args(self.name(), args)?;
        let invoice = fetch(self.store.as_ref(), &args.invoice_number).await?;
        invoice.ensure_deletable()?;

        if !self.store.delete(&invoice.invoice_number).await? {
            return Err(AppError::NotFound(format!(
                "Invoice {} not found",
                invoice.invoice_number
            )));
        }
        tracing::info!(invoice_number = %invoice.invoice_number, "Invoice deleted");

        Ok(json!({
            "message": format!("Invoice deleted: {}", invoice.invoice_number),
        }))
    }
}

// ============= calculate_invoice_totals =============

/// Pure arithmetic, no store access
pub struct CalculateTotalsTool;

#[derive(Deserialize)]
struct CalculateTotalsArgs {
    subtotal: f64,
    tax_rate: f64,
    #[serde(default)]
    discount_amount: f64,
}

#[async_trait]
impl Tool for CalculateTotalsTool {
    fn name(&self) -> &str {
        "calculate_invoice_totals"
    }

    fn description(&self) -> &str {
        "Calculate tax and total for a subtotal, tax rate (0.08 for 8%) and optional discount"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "subtotal": { "type": "number", "minimum": 0 },
                "tax_rate": { "type": "number", "minimum": 0, "maximum": 1 },
                "discount_amount": { "type": "number", "minimum": 0 }
            },
            "required": ["subtotal", "tax_rate"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: CalculateTotalsArgs = parse_args(self.name(), args)?;
        let totals = calculate_totals(args.subtotal, args.tax_rate, args.discount_amount)?;
        serde_json::to_value(totals).map_err(|e| AppError::Internal(e.to_string()))
    }
}

/// All invoice tools over one store
pub fn invoice_tools(store: Arc<dyn InvoiceStore>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListInvoicesTool::new(Arc::clone(&store))),
        Arc::new(GetInvoiceTool::new(Arc::clone(&store))),
        Arc::new(CreateInvoiceTool::new(Arc::clone(&store))),
        Arc::new(UpdateInvoiceTool::new(Arc::clone(&store))),
        Arc::new(DeleteInvoiceTool::new(store)),
        Arc::new(CalculateTotalsTool),
    ]
}
