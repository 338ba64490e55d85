//! Domain models and request bodies for the back-office API.
//!
//! Response types derive `Serialize`; request bodies derive `Deserialize`
//! and `validator::Validate` and are extracted with
//! [`Validated`](crate::extract::Validated).

pub mod article;
pub mod category;
pub mod client;
pub mod client_order;
pub mod expedition;
pub mod invoice;
pub mod order;
pub mod supplier;
pub mod supplier_order;

use std::borrow::Cow;

use rust_decimal::Decimal;
use validator::ValidationError;

use comptoir_core::{MAX_AMOUNT, is_valid_amount};

fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::from(message));
    err
}

/// Rejects empty or whitespace-only strings.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(rule_error("blank", "must not be blank"));
    }
    Ok(())
}

/// Accepts money amounts that fit the store's `NUMERIC(12, 2)` columns.
pub(crate) fn money(value: &Decimal) -> Result<(), ValidationError> {
    if is_valid_amount(*value) {
        return Ok(());
    }
    if value.is_sign_negative() && !value.is_zero() {
        return Err(rule_error("negative", "must not be negative"));
    }
    if *value > MAX_AMOUNT {
        return Err(rule_error("too_large", "must not exceed 9999999999.99"));
    }
    Err(rule_error("precision", "must have at most two decimal places"))
}

/// Trim a required text field.
pub(crate) fn clean(value: &str) -> String {
    value.trim().to_owned()
}

/// Trim an optional text field, treating blank as absent.
pub(crate) fn clean_opt(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("A1").is_ok());
        assert!(not_blank("").is_err());
        assert!(not_blank(" \t").is_err());
    }

    fn code(value: &str) -> Option<String> {
        money(&value.parse().unwrap()).err().map(|e| e.code.into_owned())
    }

    #[test]
    fn test_money() {
        assert_eq!(code("0"), None);
        assert_eq!(code("19.99"), None);
        assert_eq!(code("9999999999.99"), None);
        assert_eq!(code("-0.01").as_deref(), Some("negative"));
        assert_eq!(code("10000000000").as_deref(), Some("too_large"));
        assert_eq!(code("79228162514264337593543950335").as_deref(), Some("too_large"));
        assert_eq!(code("1.005").as_deref(), Some("precision"));
    }

    #[test]
    fn test_clean_opt_drops_blank() {
        assert_eq!(clean_opt(Some("  note ")), Some("note".to_owned()));
        assert_eq!(clean_opt(Some("   ")), None);
        assert_eq!(clean_opt(None), None);
    }
}
