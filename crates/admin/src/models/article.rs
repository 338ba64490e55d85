//! Articles: the sellable inventory.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use comptoir_core::{ArticleId, CategoryId, Discount, discounted_price};

use super::category::CategorySummary;
use super::{money, not_blank};

/// Default `threshold` for `GET /api/articles/low-stock`.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;

/// An article with its current stock level.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Article {
    pub id: ArticleId,
    pub code: String,
    pub designation: String,
    pub description: Option<String>,
    /// Units in stock. Never negative.
    pub quantity: i32,
    /// List price before discount.
    pub price: Decimal,
    pub discount: Option<Discount>,
    pub category_id: CategoryId,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Price a client pays per unit today.
    #[must_use]
    pub fn sale_price(&self) -> Decimal {
        discounted_price(self.price, self.discount)
    }
}

/// An article with its category joined, as returned by `GET /api/articles/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: Article,
    pub sale_price: Decimal,
    pub category: CategorySummary,
}

/// Request body for `POST /api/articles`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewArticle {
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub code: String,
    #[validate(custom(function = "not_blank"))]
    pub designation: String,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[validate(custom(function = "money"))]
    pub price: Decimal,
    /// Rejected during deserialization when outside 0-100.
    pub discount: Option<Discount>,
    pub category_id: CategoryId,
    #[validate(length(max = 2048))]
    pub image: Option<String>,
}

/// Request body for `PUT /api/articles/{id}`. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ArticleUpdate {
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub code: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub designation: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
    #[validate(custom(function = "money"))]
    pub price: Option<Decimal>,
    pub discount: Option<Discount>,
    pub category_id: Option<CategoryId>,
    #[validate(length(max = 2048))]
    pub image: Option<String>,
}

/// Request body for `POST /api/articles/{id}/stock`.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct StockAdjustment {
    /// Units to add (positive) or remove (negative).
    #[validate(range(min = -1_000_000, max = 1_000_000))]
    pub delta: i32,
}

/// Query string for `GET /api/articles`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleFilter {
    pub category_id: Option<CategoryId>,
    /// Case-insensitive match on code or designation.
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query string for `GET /api/articles/low-stock`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i32>,
}
