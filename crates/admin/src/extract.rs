//! Request extractors that reject bad input as [`AppError`].
//!
//! Axum's stock extractors answer with plain-text rejections. These wrappers
//! keep every error response in the JSON shape produced by `AppError`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

/// A field-level validation error.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub code: String,
}

/// Container for validation errors, used as the payload of `AppError::Validation`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorResponse {
    pub errors: Vec<FieldError>,
}

/// JSON body extractor that also runs `validator::Validate`.
///
/// Malformed JSON (syntax, missing fields, wrong types) is a 400.
/// A well-formed body that fails its validation rules is a 422.
pub struct Validated<T>(pub T);

impl<T, S> FromRequest<S> for Validated<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::BadRequest(rejection.body_text()))?;

        value.validate().map_err(|errors| {
            AppError::Validation(ValidationErrorResponse {
                errors: convert_validation_errors(&errors),
            })
        })?;

        Ok(Self(value))
    }
}

fn convert_validation_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    let mut result: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            let field = field.to_string();
            field_errors.iter().map(move |error| FieldError {
                field: field.clone(),
                message: error.message.as_ref().map_or_else(
                    || format!("Validation failed for field '{field}'"),
                    ToString::to_string,
                ),
                code: error.code.to_string(),
            })
        })
        .collect();
    // HashMap order is unstable
    result.sort_by(|a, b| a.field.cmp(&b.field));
    result
}

/// Path parameters with a JSON 400 on parse failure.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParam<T>(pub T);

/// Query string with a JSON 400 on parse failure.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

/// `?limit=&offset=` paging for list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Resolved page bounds passed to repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 100;
    pub const MAX_LIMIT: i64 = 500;

    /// Clamp caller-supplied paging into `1..=500` rows from a non-negative offset.
    #[must_use]
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl From<Pagination> for Page {
    fn from(p: Pagination) -> Self {
        Self::new(p.limit, p.offset)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::borrow::Cow;

    use validator::{ValidationError, ValidationErrors};

    use super::*;

    #[test]
    fn test_page_defaults() {
        assert_eq!(
            Page::default(),
            Page {
                limit: 100,
                offset: 0
            }
        );
    }

    #[test]
    fn test_page_clamps_limit_and_offset() {
        assert_eq!(Page::new(Some(10_000), Some(-4)), Page { limit: 500, offset: 0 });
        assert_eq!(Page::new(Some(0), Some(20)), Page { limit: 1, offset: 20 });
    }

    #[test]
    fn test_convert_validation_errors_keeps_custom_message() {
        let mut errors = ValidationErrors::new();
        let mut blank = ValidationError::new("blank");
        blank.message = Some(Cow::from("must not be blank"));
        errors.add("code", blank);
        errors.add("description", ValidationError::new("length"));

        let converted = convert_validation_errors(&errors);
        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].field, "code");
        assert_eq!(converted[0].message, "must not be blank");
        assert_eq!(converted[1].field, "description");
        assert_eq!(converted[1].code, "length");
        assert!(converted[1].message.contains("description"));
    }
}
