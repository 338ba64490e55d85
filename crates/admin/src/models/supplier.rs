//! Suppliers: the parties that fulfil restock orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use comptoir_core::{Email, SupplierId};

use super::not_blank;

/// A supplier record. Unlike clients, the postal address is mandatory.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Supplier {
    pub id: SupplierId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplierSummary {
    pub id: SupplierId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
}

/// Request body for `POST /api/suppliers`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewSupplier {
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub first_name: String,
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub last_name: String,
    pub email: Email,
    #[validate(custom(function = "not_blank"), length(max = 32))]
    pub phone: String,
    #[validate(custom(function = "not_blank"))]
    pub address1: String,
    pub address2: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub city: String,
    #[validate(custom(function = "not_blank"))]
    pub country: String,
}

/// Request body for `PUT /api/suppliers/{id}`. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SupplierUpdate {
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub first_name: Option<String>,
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub last_name: Option<String>,
    pub email: Option<Email>,
    #[validate(custom(function = "not_blank"), length(max = 32))]
    pub phone: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub address1: Option<String>,
    pub address2: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub city: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub country: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_supplier_requires_address() {
        let missing_city = serde_json::from_value::<NewSupplier>(serde_json::json!({
            "first_name": "Jean",
            "last_name": "Dupont",
            "email": "jean@grossiste.fr",
            "phone": "0102030405",
            "address1": "1 rue du Port",
            "country": "FR"
        }));
        assert!(missing_city.is_err());

        let blank_city: NewSupplier = serde_json::from_value(serde_json::json!({
            "first_name": "Jean",
            "last_name": "Dupont",
            "email": "jean@grossiste.fr",
            "phone": "0102030405",
            "address1": "1 rue du Port",
            "city": " ",
            "country": "FR"
        }))
        .unwrap();
        assert!(blank_city.validate().unwrap_err().field_errors().contains_key("city"));
    }
}
