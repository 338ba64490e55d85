//! Core types for Comptoir.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{
    Discount, DiscountError, MAX_AMOUNT, MoneyError, discounted_price, is_valid_amount, line_amount,
    order_total,
};
pub use status::*;
