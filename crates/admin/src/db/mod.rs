//! Database operations for the back-office `PostgreSQL` store.
//!
//! # Tables
//!
//! - `categories` - Article categories
//! - `articles` - Sellable inventory with stock quantity and price
//! - `clients` / `suppliers` - Parties that place or fulfil orders
//! - `expeditions` - Shipping methods and their cost
//! - `client_orders` / `client_order_lines` - Sales, reserving stock
//! - `supplier_orders` / `supplier_order_lines` - Restocks, replenishing stock
//! - `client_invoices` / `client_invoice_lines` - One invoice per client order
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p comptoir-cli -- migrate
//! ```

pub mod articles;
pub mod categories;
pub mod client_invoices;
pub mod client_orders;
pub mod clients;
pub mod expeditions;
pub mod stock;
pub mod supplier_orders;
pub mod suppliers;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use comptoir_core::{ArticleId, MoneyError, OrderStatus};

pub use articles::ArticleRepository;
pub use categories::CategoryRepository;
pub use client_invoices::ClientInvoiceRepository;
pub use client_orders::ClientOrderRepository;
pub use clients::ClientRepository;
pub use expeditions::ExpeditionRepository;
pub use supplier_orders::SupplierOrderRepository;
pub use suppliers::SupplierRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate code, record still referenced).
    #[error("{0}")]
    Conflict(String),

    /// A referenced record (category, article, expedition...) does not exist.
    #[error("{0}")]
    InvalidReference(String),

    /// A value was rejected by a table CHECK constraint.
    #[error("{0}")]
    InvalidValue(String),

    /// Applying an order would drive an article's stock below zero.
    #[error(
        "insufficient stock for article {article_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        article_id: ArticleId,
        requested: i32,
        available: i32,
    },
}

impl RepositoryError {
    /// Classify an error raised by an `INSERT` or `UPDATE`.
    ///
    /// Unique violations become [`RepositoryError::Conflict`], foreign key
    /// violations [`RepositoryError::InvalidReference`] and check violations
    /// [`RepositoryError::InvalidValue`], each with a message chosen from the
    /// constraint name.
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            let constraint = db_err.constraint().unwrap_or_default();
            if db_err.is_unique_violation() {
                return Self::Conflict(unique_message(constraint).to_owned());
            }
            if db_err.is_foreign_key_violation() {
                return Self::InvalidReference(reference_message(constraint).to_owned());
            }
            if db_err.is_check_violation() {
                return Self::InvalidValue(check_message(constraint).to_owned());
            }
            if db_err.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE) {
                return Self::InvalidValue("value out of range".to_owned());
            }
        }
        Self::Database(err)
    }

    /// Classify an error raised by a `DELETE`.
    ///
    /// A foreign key violation here means other rows still point at the
    /// record, reported as a [`RepositoryError::Conflict`] with `in_use`.
    pub(crate) fn from_delete(err: sqlx::Error, in_use: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_foreign_key_violation()
        {
            return Self::Conflict(in_use.to_owned());
        }
        Self::Database(err)
    }
}

impl From<MoneyError> for RepositoryError {
    fn from(err: MoneyError) -> Self {
        Self::InvalidValue(err.to_string())
    }
}

/// `PostgreSQL` SQLSTATE for a value that does not fit its column type.
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

fn unique_message(constraint: &str) -> &'static str {
    match constraint {
        "categories_code_key" => "a category with this code already exists",
        "articles_code_key" => "an article with this code already exists",
        "clients_email_key" => "a client with this email already exists",
        "suppliers_email_key" => "a supplier with this email already exists",
        "client_orders_code_key" => "a client order with this code already exists",
        "supplier_orders_code_key" => "a supplier order with this code already exists",
        "client_invoices_order_id_key" => "this order already has an invoice",
        _ => "record already exists",
    }
}

fn reference_message(constraint: &str) -> &'static str {
    match constraint {
        "articles_category_id_fkey" | "supplier_orders_category_id_fkey" => {
            "category does not exist"
        }
        "client_order_lines_article_id_fkey" | "supplier_order_lines_article_id_fkey" => {
            "article does not exist"
        }
        "client_orders_client_id_fkey" => "client does not exist",
        "supplier_orders_supplier_id_fkey" => "supplier does not exist",
        "client_orders_expedition_id_fkey" | "supplier_orders_expedition_id_fkey" => {
            "expedition does not exist"
        }
        _ => "referenced record does not exist",
    }
}

fn check_message(constraint: &str) -> &'static str {
    match constraint {
        "articles_quantity_check" => "quantity cannot be negative",
        "articles_price_check" => "price cannot be negative",
        "articles_discount_check" => "discount must be between 0 and 100",
        "expeditions_cost_check" => "cost cannot be negative",
        _ => "value out of range",
    }
}

/// Refuse status changes an order's lifecycle does not allow.
pub(crate) fn check_transition(from: OrderStatus, to: OrderStatus) -> Result<(), RepositoryError> {
    if from.can_transition_to(to) {
        return Ok(());
    }
    let message = match from {
        OrderStatus::Cancelled => "cancelled orders cannot be reopened".to_owned(),
        _ => format!("{from} orders cannot be {to}"),
    };
    Err(RepositoryError::Conflict(message))
}

/// Create a `PostgreSQL` connection pool.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(max_connections.min(2))
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_messages_by_constraint() {
        assert_eq!(
            unique_message("clients_email_key"),
            "a client with this email already exists"
        );
        assert_eq!(
            unique_message("client_invoices_order_id_key"),
            "this order already has an invoice"
        );
        assert_eq!(unique_message("something_else"), "record already exists");
    }

    #[test]
    fn test_reference_messages_by_constraint() {
        assert_eq!(
            reference_message("articles_category_id_fkey"),
            "category does not exist"
        );
        assert_eq!(
            reference_message("supplier_orders_expedition_id_fkey"),
            "expedition does not exist"
        );
        assert_eq!(reference_message(""), "referenced record does not exist");
    }

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = RepositoryError::from_write(sqlx::Error::RowNotFound);
        assert!(matches!(err, RepositoryError::Database(_)));

        let err = RepositoryError::from_delete(sqlx::Error::PoolTimedOut, "in use");
        assert!(matches!(err, RepositoryError::Database(_)));
    }

    #[test]
    fn test_check_transition_messages() {
        assert!(check_transition(OrderStatus::Pending, OrderStatus::Shipped).is_ok());

        let err = check_transition(OrderStatus::Cancelled, OrderStatus::Pending).unwrap_err();
        assert_eq!(err.to_string(), "cancelled orders cannot be reopened");

        let err = check_transition(OrderStatus::Delivered, OrderStatus::Cancelled).unwrap_err();
        assert_eq!(err.to_string(), "delivered orders cannot be cancelled");
    }

    #[test]
    fn test_insufficient_stock_display() {
        let err = RepositoryError::InsufficientStock {
            article_id: ArticleId::new(7),
            requested: 5,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for article 7: requested 5, available 2"
        );
    }
}
