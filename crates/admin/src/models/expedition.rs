//! Expeditions: shipping methods attached to orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use comptoir_core::ExpeditionId;

use super::{money, not_blank};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Expedition {
    pub id: ExpeditionId,
    pub name: String,
    pub cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Expedition reference embedded in order responses.
#[derive(Debug, Clone, Serialize)]
pub struct ExpeditionSummary {
    pub id: ExpeditionId,
    pub name: String,
    pub cost: Decimal,
}

/// Request body for `POST /api/expeditions`, also accepted inline in orders.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NewExpedition {
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub name: String,
    #[validate(custom(function = "money"))]
    pub cost: Decimal,
}

/// Request body for `PUT /api/expeditions/{id}`. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ExpeditionUpdate {
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub name: Option<String>,
    #[validate(custom(function = "money"))]
    pub cost: Option<Decimal>,
}
