//! Supplier repository.

use sqlx::PgPool;

use comptoir_core::SupplierId;

use super::RepositoryError;
use crate::extract::Page;
use crate::models::supplier::{NewSupplier, Supplier, SupplierUpdate};
use crate::models::{clean, clean_opt};

const SUPPLIER_COLUMNS: &str = "id, first_name, last_name, email, phone, \
                                address1, address2, city, country, created_at, updated_at";

/// Repository for supplier database operations.
pub struct SupplierRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SupplierRepository<'a> {
    /// Create a new supplier repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List suppliers ordered by last then first name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, page: Page) -> Result<Vec<Supplier>, RepositoryError> {
        let rows = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers \
             ORDER BY last_name, first_name, id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Get a supplier by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: SupplierId) -> Result<Option<Supplier>, RepositoryError> {
        let row = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a supplier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, input: &NewSupplier) -> Result<Supplier, RepositoryError> {
        sqlx::query_as::<_, Supplier>(&format!(
            "INSERT INTO suppliers \
                (first_name, last_name, email, phone, address1, address2, city, country) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {SUPPLIER_COLUMNS}"
        ))
        .bind(clean(&input.first_name))
        .bind(clean(&input.last_name))
        .bind(&input.email)
        .bind(clean(&input.phone))
        .bind(clean(&input.address1))
        .bind(clean_opt(input.address2.as_deref()))
        .bind(clean(&input.city))
        .bind(clean(&input.country))
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_write)
    }

    /// Update the supplied fields of a supplier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the supplier does not exist.
    /// Returns `RepositoryError::Conflict` if the new email is taken.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: SupplierId,
        input: &SupplierUpdate,
    ) -> Result<Supplier, RepositoryError> {
        sqlx::query_as::<_, Supplier>(&format!(
            "UPDATE suppliers SET \
                first_name = COALESCE($2, first_name), \
                last_name = COALESCE($3, last_name), \
                email = COALESCE($4, email), \
                phone = COALESCE($5, phone), \
                address1 = COALESCE($6, address1), \
                address2 = COALESCE($7, address2), \
                city = COALESCE($8, city), \
                country = COALESCE($9, country), \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {SUPPLIER_COLUMNS}"
        ))
        .bind(id)
        .bind(input.first_name.as_deref().map(clean))
        .bind(input.last_name.as_deref().map(clean))
        .bind(input.email.as_ref())
        .bind(input.phone.as_deref().map(clean))
        .bind(input.address1.as_deref().map(clean))
        .bind(clean_opt(input.address2.as_deref()))
        .bind(input.city.as_deref().map(clean))
        .bind(input.country.as_deref().map(clean))
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::from_write)?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a supplier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the supplier does not exist.
    /// Returns `RepositoryError::Conflict` if the supplier has orders.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: SupplierId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                RepositoryError::from_delete(e, "supplier has orders and cannot be deleted")
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
