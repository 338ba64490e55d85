//! Supplier (restock) orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use comptoir_core::{
    ArticleId, CategoryId, OrderStatus, SupplierId, SupplierOrderId, SupplierOrderLineId,
};

use super::expedition::ExpeditionSummary;
use super::not_blank;
use super::order::{ExpeditionRef, SupplierLineInput, valid_expedition, valid_supplier_lines};
use super::supplier::SupplierSummary;

/// A supplier order with its supplier, expedition and lines joined.
#[derive(Debug, Clone, Serialize)]
pub struct SupplierOrder {
    pub id: SupplierOrderId,
    pub code: String,
    pub order_date: DateTime<Utc>,
    pub supplier: SupplierSummary,
    pub expedition: ExpeditionSummary,
    pub delivery_note: Option<String>,
    pub payment_method: String,
    pub category_id: Option<CategoryId>,
    pub note: Option<String>,
    pub status: OrderStatus,
    pub total: Decimal,
    pub lines: Vec<SupplierOrderLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplierOrderLine {
    pub id: SupplierOrderLineId,
    pub article_id: ArticleId,
    pub article_code: String,
    pub designation: String,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub amount: Decimal,
}

/// Request body for `POST /api/supplier-orders`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewSupplierOrder {
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub code: String,
    pub order_date: DateTime<Utc>,
    pub supplier_id: SupplierId,
    #[validate(custom(function = "valid_expedition"))]
    pub expedition: ExpeditionRef,
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub payment_method: String,
    pub delivery_note: Option<String>,
    pub category_id: Option<CategoryId>,
    pub note: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[validate(custom(function = "valid_supplier_lines"))]
    pub lines: Vec<SupplierLineInput>,
}

/// Request body for `PATCH /api/supplier-orders/{id}`. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SupplierOrderPatch {
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub code: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    pub supplier_id: Option<SupplierId>,
    #[validate(custom(function = "valid_expedition"))]
    pub expedition: Option<ExpeditionRef>,
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub payment_method: Option<String>,
    pub delivery_note: Option<String>,
    pub category_id: Option<CategoryId>,
    pub note: Option<String>,
    pub status: Option<OrderStatus>,
    #[validate(custom(function = "valid_supplier_lines"))]
    pub lines: Option<Vec<SupplierLineInput>>,
}

impl SupplierOrderPatch {
    #[must_use]
    pub const fn affects_total(&self) -> bool {
        self.lines.is_some() || self.expedition.is_some()
    }
}

/// Query string for `GET /api/supplier-orders`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SupplierOrderFilter {
    pub supplier_id: Option<SupplierId>,
    pub status: Option<OrderStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Response body for `POST /api/supplier-orders`.
#[derive(Debug, Clone, Serialize)]
pub struct SupplierOrderCreated {
    pub message: &'static str,
    pub order: SupplierOrder,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_expedition_and_cost_lines() {
        let order: NewSupplierOrder = serde_json::from_value(serde_json::json!({
            "code": "PO-7",
            "order_date": "2024-03-01T10:00:00Z",
            "supplier_id": 3,
            "expedition": { "name": "Pallet freight", "cost": "80.00" },
            "payment_method": "transfer",
            "lines": [
                { "article_id": 1, "quantity": 48, "unit_cost": "1.20" },
                { "article_id": 2, "quantity": 12, "unit_cost": "3.05" }
            ]
        }))
        .unwrap();

        assert!(order.validate().is_ok());
        assert!(matches!(order.expedition, ExpeditionRef::Inline(_)));
        assert_eq!(order.lines.len(), 2);
    }

    #[test]
    fn test_lines_require_unit_cost() {
        let result = serde_json::from_value::<NewSupplierOrder>(serde_json::json!({
            "code": "PO-7",
            "order_date": "2024-03-01T10:00:00Z",
            "supplier_id": 3,
            "expedition": 1,
            "payment_method": "transfer",
            "lines": [{ "article_id": 1, "quantity": 48 }]
        }));
        assert!(result.is_err());
    }
}
