//! Clients: the parties that place sales orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use comptoir_core::{ClientId, Email};

use super::not_blank;

/// A client record.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Client {
    pub id: ClientId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub url: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client reference embedded in order and invoice responses.
#[derive(Debug, Clone, Serialize)]
pub struct ClientSummary {
    pub id: ClientId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
}

/// Request body for `POST /api/clients`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewClient {
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub first_name: String,
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub last_name: String,
    pub email: Email,
    #[validate(custom(function = "not_blank"), length(max = 32))]
    pub phone: String,
    #[validate(url)]
    pub url: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Request body for `PUT /api/clients/{id}`. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ClientUpdate {
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub first_name: Option<String>,
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub last_name: Option<String>,
    pub email: Option<Email>,
    #[validate(custom(function = "not_blank"), length(max = 32))]
    pub phone: Option<String>,
    #[validate(url)]
    pub url: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}
