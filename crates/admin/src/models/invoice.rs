//! Client invoices, generated from a client order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use comptoir_core::{ArticleId, ClientInvoiceId, ClientInvoiceLineId, ClientOrderId};

use super::client::ClientSummary;

/// An invoice with the order and client joined.
#[derive(Debug, Clone, Serialize)]
pub struct ClientInvoice {
    pub id: ClientInvoiceId,
    pub order_id: ClientOrderId,
    pub order_code: String,
    pub order_date: DateTime<Utc>,
    pub client: ClientSummary,
    pub lines: Vec<ClientInvoiceLine>,
    /// Equal to the order total at the time of invoicing.
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientInvoiceLine {
    pub id: ClientInvoiceLineId,
    pub article_id: ArticleId,
    pub designation: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub amount: Decimal,
}
