//! Client (sales) orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use comptoir_core::{ArticleId, ClientId, ClientOrderId, ClientOrderLineId, OrderStatus};

use super::client::ClientSummary;
use super::expedition::ExpeditionSummary;
use super::not_blank;
use super::order::{ClientLineInput, ExpeditionRef, valid_client_lines, valid_expedition};

/// A client order with its client, expedition and lines joined.
#[derive(Debug, Clone, Serialize)]
pub struct ClientOrder {
    pub id: ClientOrderId,
    pub code: String,
    pub order_date: DateTime<Utc>,
    pub client: ClientSummary,
    pub expedition: ExpeditionSummary,
    pub delivery_note: Option<String>,
    pub payment_method: String,
    pub tracking_code: Option<String>,
    pub status: OrderStatus,
    pub free_shipping: bool,
    /// Sum of line amounts plus shipping (unless free).
    pub total: Decimal,
    pub lines: Vec<ClientOrderLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientOrderLine {
    pub id: ClientOrderLineId,
    pub article_id: ArticleId,
    pub article_code: String,
    pub designation: String,
    pub quantity: i32,
    /// Discounted article price at the time the line was written.
    pub unit_price: Decimal,
    pub amount: Decimal,
}

/// Request body for `POST /api/client-orders`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewClientOrder {
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub code: String,
    pub order_date: DateTime<Utc>,
    pub client_id: ClientId,
    #[validate(custom(function = "valid_expedition"))]
    pub expedition: ExpeditionRef,
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub payment_method: String,
    pub delivery_note: Option<String>,
    pub tracking_code: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub free_shipping: bool,
    #[validate(custom(function = "valid_client_lines"))]
    pub lines: Vec<ClientLineInput>,
}

/// Request body for `PATCH /api/client-orders/{id}`. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ClientOrderPatch {
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub code: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    pub client_id: Option<ClientId>,
    #[validate(custom(function = "valid_expedition"))]
    pub expedition: Option<ExpeditionRef>,
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub payment_method: Option<String>,
    pub delivery_note: Option<String>,
    pub tracking_code: Option<String>,
    pub status: Option<OrderStatus>,
    pub free_shipping: Option<bool>,
    #[validate(custom(function = "valid_client_lines"))]
    pub lines: Option<Vec<ClientLineInput>>,
}

impl ClientOrderPatch {
    /// Whether the patch changes anything the total depends on.
    #[must_use]
    pub const fn affects_total(&self) -> bool {
        self.lines.is_some() || self.expedition.is_some() || self.free_shipping.is_some()
    }

    /// Whether the patch would make an issued invoice disagree with the
    /// order: a new total, or cancelling an order in `current` status.
    #[must_use]
    pub fn breaks_invoice(&self, current: OrderStatus) -> bool {
        let cancels = self.status == Some(OrderStatus::Cancelled) && current != OrderStatus::Cancelled;
        cancels || self.affects_total()
    }
}

/// Query string for `GET /api/client-orders`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ClientOrderFilter {
    pub client_id: Option<ClientId>,
    pub status: Option<OrderStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Response body for `POST /api/client-orders`.
#[derive(Debug, Clone, Serialize)]
pub struct ClientOrderCreated {
    pub message: &'static str,
    pub order: ClientOrder,
}
