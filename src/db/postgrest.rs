//! Invoice store over a PostgREST endpoint (Supabase).
//!
//! Rows live in `{schema}.{table}` and are addressed through
//! `{url}/rest/v1/{table}` with PostgREST's `column=op.value` query filters.

use super::invoice::{Invoice, InvoiceFilter};
use super::traits::InvoiceStore;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub struct PostgrestInvoiceStore {
    client: Client,
    endpoint: String,
    api_key: String,
    schema: String,
}

impl PostgrestInvoiceStore {
    pub fn new(
        url: &str,
        api_key: &str,
        schema: &str,
        table: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Database(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", url.trim_end_matches('/'), table),
            api_key: api_key.to_string(),
            schema: schema.to_string(),
        })
    }

    /// Attach auth and schema headers.
    ///
    /// PostgREST reads the schema from `Accept-Profile` on reads and from
    /// `Content-Profile` on writes, so both are always sent.
    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept-Profile", &self.schema)
            .header("Content-Profile", &self.schema)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| AppError::Database(format!("Invoice store request failed: {}", e)))?;

        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| AppError::Database(format!("Invalid invoice store response: {}", e)))
    }

    fn by_number(&self, builder: RequestBuilder, invoice_number: &str) -> RequestBuilder {
        builder.query(&[("invoice_number", format!("eq.{}", invoice_number))])
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(%status, body = %body, "Invoice store rejected request");

    Err(match status {
        StatusCode::CONFLICT => AppError::InvalidInput(format!(
            "An invoice with that number already exists: {}",
            body
        )),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AppError::Database(format!("Invoice store denied access ({})", status))
        }
        _ => AppError::Database(format!("Invoice store error {}: {}", status, body)),
    })
}

/// Query pairs for a list request
fn list_query(filter: &InvoiceFilter) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("select", "*".to_string()),
        ("order", "issue_date.desc,invoice_number.desc".to_string()),
        ("limit", filter.effective_limit().to_string()),
    ];
    if let Some(client) = &filter.client_name {
        // PostgREST uses `*` as the LIKE wildcard in URLs
        query.push(("client_name", format!("ilike.*{}*", client.trim())));
    }
    if let Some(status) = filter.status {
        query.push(("status", format!("eq.{}", status)));
    }
    if let Some(from) = filter.issued_from {
        query.push(("issue_date", format!("gte.{}", from)));
    }
    if let Some(to) = filter.issued_to {
        query.push(("issue_date", format!("lte.{}", to)));
    }
    if let Some(before) = filter.due_before {
        query.push(("due_date", format!("lt.{}", before)));
    }
    query
}

/// Insert/update payload; the id is owned by the database
fn row_payload(invoice: &Invoice) -> Result<serde_json::Value> {
    let mut row = serde_json::to_value(invoice).map_err(|e| AppError::Internal(e.to_string()))?;
    if let Some(object) = row.as_object_mut() {
        object.remove("id");
    }
    Ok(row)
}

#[async_trait]
impl InvoiceStore for PostgrestInvoiceStore {
    async fn list(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
        self.send(self.client.get(&self.endpoint).query(&list_query(filter)))
            .await
    }

    async fn get(&self, invoice_number: &str) -> Result<Option<Invoice>> {
        let builder = self
            .client
            .get(&self.endpoint)
            .query(&[("select", "*"), ("limit", "1")]);
        let rows: Vec<Invoice> = self.send(self.by_number(builder, invoice_number)).await?;
        Ok(rows.into_iter().next())
    }

    async fn create(&self, invoice: &Invoice) -> Result<Invoice> {
        let builder = self
            .client
            .post(&self.endpoint)
            .header("Prefer", "return=representation")
            .json(&row_payload(invoice)?);

        let rows: Vec<Invoice> = self.send(builder).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::Database("Insert returned no rows".to_string()))
    }

    async fn update(&self, invoice: &Invoice) -> Result<Invoice> {
        let builder = self
            .client
            .patch(&self.endpoint)
            .header("Prefer", "return=representation")
            .json(&row_payload(invoice)?);

        let rows: Vec<Invoice> = self
            .send(self.by_number(builder, &invoice.invoice_number))
            .await?;
        rows.into_iter().next().ok_or_else(|| {
            AppError::NotFound(format!("Invoice {} not found", invoice.invoice_number))
        })
    }

    async fn delete(&self, invoice_number: &str) -> Result<bool> {
        let builder = self
            .client
            .delete(&self.endpoint)
            .header("Prefer", "return=representation");

        let rows: Vec<serde_json::Value> =
            self.send(self.by_number(builder, invoice_number)).await?;
        Ok(!rows.is_empty())
    }

    fn backend(&self) -> &'static str {
        "postgrest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::invoice::InvoiceStatus;

    #[test]
    fn test_endpoint() {
        let store = PostgrestInvoiceStore::new(
            "https://demo.supabase.co/",
            "key",
            "api",
            "invoices",
            Duration::from_secs(10),
        )
        .unwrap();
        assert_eq!(store.endpoint, "https://demo.supabase.co/rest/v1/invoices");
    }

    #[test]
    fn test_list_query() {
        let filter = InvoiceFilter {
            client_name: Some(" Acme ".to_string()),
            status: Some(InvoiceStatus::Overdue),
            issued_from: chrono::NaiveDate::from_ymd_opt(2025, 1, 1),
            issued_to: chrono::NaiveDate::from_ymd_opt(2025, 3, 31),
            due_before: chrono::NaiveDate::from_ymd_opt(2025, 4, 15),
            limit: Some(500),
        };

        let query = list_query(&filter);
        assert!(query.contains(&("client_name", "ilike.*Acme*".to_string())));
        assert!(query.contains(&("status", "eq.overdue".to_string())));
        assert!(query.contains(&("issue_date", "gte.2025-01-01".to_string())));
        assert!(query.contains(&("issue_date", "lte.2025-03-31".to_string())));
        assert!(query.contains(&("due_date", "lt.2025-04-15".to_string())));
        assert!(query.contains(&("limit", "100".to_string())));

        let bare = list_query(&InvoiceFilter::default());
        assert!(!bare.iter().any(|(key, _)| *key == "issue_date" || *key == "due_date"));
    }

    #[test]
    fn test_row_payload_drops_id() {
        let invoice = crate::db::invoice::NewInvoice {
            invoice_number: "INV-1".to_string(),
            client_name: "Acme".to_string(),
            subtotal: 10.0,
            ..Default::default()
        }
        .into_invoice(chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
        .map(|mut i| {
            i.id = Some(uuid::Uuid::new_v4());
            i
        })
        .unwrap();

        let payload = row_payload(&invoice).unwrap();
        assert!(payload.get("id").is_none());
        assert_eq!(payload["status"], "draft");
        assert_eq!(payload["issue_date"], "2025-01-01");
    }
}
