//! Article categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use comptoir_core::CategoryId;

use super::not_blank;

/// A category grouping articles (e.g. "BEV" / "Beverages").
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub code: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short category reference embedded in article responses.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub code: String,
    pub description: String,
}

/// Request body for `POST /api/categories`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCategory {
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub code: String,
    #[validate(custom(function = "not_blank"))]
    pub description: String,
}

/// Request body for `PUT /api/categories/{id}`. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CategoryUpdate {
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub code: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub description: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_category_requires_code_and_description() {
        let ok: NewCategory =
            serde_json::from_str(r#"{"code":"BEV","description":"Beverages"}"#).unwrap();
        assert!(ok.validate().is_ok());

        let blank: NewCategory =
            serde_json::from_str(r#"{"code":"  ","description":"Beverages"}"#).unwrap();
        let errors = blank.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("code"));

        assert!(serde_json::from_str::<NewCategory>(r#"{"code":"BEV"}"#).is_err());
    }

    #[test]
    fn test_update_validates_only_present_fields() {
        let empty: CategoryUpdate = serde_json::from_str("{}").unwrap();
        assert!(empty.validate().is_ok());

        let blank: CategoryUpdate = serde_json::from_str(r#"{"description":""}"#).unwrap();
        assert!(blank.validate().is_err());
    }
}
