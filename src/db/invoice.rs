//! Invoice records and the arithmetic that keeps their amounts consistent.
//!
//! Amounts are stored as `f64` rounded to cents, matching the `numeric(12,2)`
//! columns of the hosted `invoices` table.

use crate::types::{AppError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Round to two decimal places
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Lifecycle state of an invoice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Viewed,
    Partial,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 7] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Sent,
        InvoiceStatus::Viewed,
        InvoiceStatus::Partial,
        InvoiceStatus::Paid,
        InvoiceStatus::Overdue,
        InvoiceStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Viewed => "viewed",
            InvoiceStatus::Partial => "partial",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        InvoiceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == lower)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown invoice status '{}'", s)))
    }
}

/// Derived amounts of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
}

/// Compute tax and total from a subtotal, tax rate (0..=1) and discount.
pub fn calculate_totals(
    subtotal: f64,
    tax_rate: f64,
    discount_amount: f64,
) -> Result<InvoiceTotals> {
    if !subtotal.is_finite() || subtotal < 0.0 {
        return Err(AppError::InvalidInput(
            "subtotal must be zero or positive".to_string(),
        ));
    }
    if !tax_rate.is_finite() || !(0.0..=1.0).contains(&tax_rate) {
        return Err(AppError::InvalidInput(
            "tax_rate must be between 0 and 1 (e.g. 0.08 for 8%)".to_string(),
        ));
    }
    if !discount_amount.is_finite() || discount_amount < 0.0 {
        return Err(AppError::InvalidInput(
            "discount_amount must be zero or positive".to_string(),
        ));
    }

    let tax_amount = round_cents(subtotal * tax_rate);
    let total_amount = round_cents(subtotal + tax_amount - discount_amount);

    Ok(InvoiceTotals {
        subtotal: round_cents(subtotal),
        tax_amount,
        discount_amount: round_cents(discount_amount),
        total_amount,
    })
}

/// One row of the `invoices` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Database-assigned key, absent before insert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub invoice_number: String,
    pub client_name: String,
    #[serde(default)]
    pub client_email: Option<String>,
    pub issue_date: NaiveDate,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
    pub subtotal: f64,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default)]
    pub tax_amount: f64,
    #[serde(default)]
    pub discount_amount: f64,
    pub total_amount: f64,
    #[serde(default)]
    pub amount_paid: f64,
    pub balance_due: f64,
    #[serde(default = "empty_line_items")]
    pub line_items: serde_json::Value,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

fn empty_line_items() -> serde_json::Value {
    serde_json::Value::Array(Vec::new())
}

impl Invoice {
    /// Recompute tax, total and balance from the stored inputs
    pub fn recalculate(&mut self) -> Result<()> {
        if !self.amount_paid.is_finite() || self.amount_paid < 0.0 {
            return Err(AppError::InvalidInput(
                "amount_paid must be zero or positive".to_string(),
            ));
        }

        let totals = calculate_totals(self.subtotal, self.tax_rate, self.discount_amount)?;
        self.subtotal = totals.subtotal;
        self.tax_amount = totals.tax_amount;
        self.discount_amount = totals.discount_amount;
        self.total_amount = totals.total_amount;
        self.amount_paid = round_cents(self.amount_paid);
        self.balance_due = round_cents(self.total_amount - self.amount_paid);
        Ok(())
    }

    /// Paid invoices are kept for the record
    pub fn ensure_deletable(&self) -> Result<()> {
        if self.status == InvoiceStatus::Paid {
            return Err(AppError::InvalidInput(format!(
                "Invoice {} is paid and cannot be deleted",
                self.invoice_number
            )));
        }
        Ok(())
    }

    /// Short spoken summary
    pub fn summary(&self) -> String {
        format!(
            "Invoice {} for {}: total ${:.2}, balance due ${:.2}, status {}",
            self.invoice_number, self.client_name, self.total_amount, self.balance_due, self.status
        )
    }
}

/// Input for creating an invoice
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub client_name: String,
    #[serde(default)]
    pub client_email: Option<String>,
    pub subtotal: f64,
    #[serde(default)]
    pub tax_rate: Option<f64>,
    #[serde(default)]
    pub discount_amount: Option<f64>,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub line_items: Option<serde_json::Value>,
}

impl NewInvoice {
    /// Validate the input and build a draft invoice issued on `today` unless given
    pub fn into_invoice(self, today: NaiveDate) -> Result<Invoice> {
        let invoice_number = self.invoice_number.trim().to_string();
        let client_name = self.client_name.trim().to_string();

        if invoice_number.is_empty() {
            return Err(AppError::InvalidInput(
                "invoice_number is required".to_string(),
            ));
        }
        if client_name.is_empty() {
            return Err(AppError::InvalidInput("client_name is required".to_string()));
        }
        if let Some(items) = &self.line_items
            && !items.is_array()
        {
            return Err(AppError::InvalidInput(
                "line_items must be a list".to_string(),
            ));
        }

        let issue_date = self.issue_date.unwrap_or(today);
        if let Some(due) = self.due_date
            && due < issue_date
        {
            return Err(AppError::InvalidInput(
                "due_date cannot be before the issue date".to_string(),
            ));
        }

        let mut invoice = Invoice {
            id: None,
            invoice_number,
            client_name,
            client_email: self.client_email,
            issue_date,
            due_date: self.due_date,
            paid_date: None,
            subtotal: self.subtotal,
            tax_rate: self.tax_rate.unwrap_or(0.0),
            tax_amount: 0.0,
            discount_amount: self.discount_amount.unwrap_or(0.0),
            total_amount: 0.0,
            amount_paid: 0.0,
            balance_due: 0.0,
            line_items: self.line_items.unwrap_or_else(empty_line_items),
            status: InvoiceStatus::Draft,
            notes: self.notes,
        };
        invoice.recalculate()?;
        Ok(invoice)
    }
}

/// Partial update of an invoice; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceUpdate {
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    #[serde(default)]
    pub amount_paid: Option<f64>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub subtotal: Option<f64>,
    #[serde(default)]
    pub tax_rate: Option<f64>,
    #[serde(default)]
    pub discount_amount: Option<f64>,
}

impl InvoiceUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.amount_paid.is_none()
            && self.due_date.is_none()
            && self.paid_date.is_none()
            && self.notes.is_none()
            && self.subtotal.is_none()
            && self.tax_rate.is_none()
            && self.discount_amount.is_none()
    }

    /// Apply the update to a copy of `invoice` and recompute derived amounts.
    ///
    /// When a payment is recorded without an explicit status, the status
    /// follows the balance: fully settled becomes `paid` (dated `today` unless
    /// a paid date is given), anything less becomes `partial`. An explicit
    /// `paid` status with no amount settles the balance; with an amount that
    /// leaves money owed it is rejected.
    pub fn apply(&self, invoice: &Invoice, today: NaiveDate) -> Result<Invoice> {
        if self.is_empty() {
            return Err(AppError::InvalidInput(
                "No fields to update were given".to_string(),
            ));
        }

        let mut updated = invoice.clone();
        if let Some(subtotal) = self.subtotal {
            updated.subtotal = subtotal;
        }
        if let Some(tax_rate) = self.tax_rate {
            updated.tax_rate = tax_rate;
        }
        if let Some(discount) = self.discount_amount {
            updated.discount_amount = discount;
        }
        if let Some(amount_paid) = self.amount_paid {
            updated.amount_paid = amount_paid;
        }
        if let Some(due_date) = self.due_date {
            updated.due_date = Some(due_date);
        }
        if let Some(notes) = &self.notes {
            updated.notes = Some(notes.clone());
        }
        updated.recalculate()?;

        match self.status {
            Some(InvoiceStatus::Paid) if updated.balance_due > 0.0 => {
                if self.amount_paid.is_some() {
                    return Err(AppError::InvalidInput(format!(
                        "Invoice {} cannot be marked paid with {:.2} still due",
                        updated.invoice_number, updated.balance_due
                    )));
                }
                // Marking paid without an amount settles the full balance
                updated.amount_paid = updated.total_amount;
                updated.recalculate()?;
                updated.status = InvoiceStatus::Paid;
            }
            Some(status) => updated.status = status,
            None if self.amount_paid.is_some() && updated.amount_paid > 0.0 => {
                updated.status = if updated.balance_due <= 0.0 {
                    InvoiceStatus::Paid
                } else {
                    InvoiceStatus::Partial
                };
            }
            None => {}
        }

        if let Some(paid_date) = self.paid_date {
            updated.paid_date = Some(paid_date);
        } else if updated.status == InvoiceStatus::Paid && updated.paid_date.is_none() {
            updated.paid_date = Some(today);
        }

        Ok(updated)
    }
}

/// Filter for listing invoices
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InvoiceFilter {
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    /// Issued on or after this date
    #[serde(default)]
    pub issued_from: Option<NaiveDate>,
    /// Issued on or before this date
    #[serde(default)]
    pub issued_to: Option<NaiveDate>,
    /// Due strictly before this date; invoices without a due date never match
    #[serde(default)]
    pub due_before: Option<NaiveDate>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl InvoiceFilter {
    pub const DEFAULT_LIMIT: usize = 20;

    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, 100)
    }

    /// Case-insensitive client match, exact status match and date bounds
    pub fn matches(&self, invoice: &Invoice) -> bool {
        let client_ok = self.client_name.as_ref().is_none_or(|name| {
            invoice
                .client_name
                .to_lowercase()
                .contains(&name.trim().to_lowercase())
        });
        let status_ok = self.status.is_none_or(|status| invoice.status == status);
        let issued_ok = self.issued_from.is_none_or(|from| invoice.issue_date >= from)
            && self.issued_to.is_none_or(|to| invoice.issue_date <= to);
        let due_ok = self
            .due_before
            .is_none_or(|before| invoice.due_date.is_some_and(|due| due < before));
        client_ok && status_ok && issued_ok && due_ok
    }
}
