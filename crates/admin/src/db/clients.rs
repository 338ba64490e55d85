//! Client repository.

use sqlx::PgPool;

use comptoir_core::ClientId;

use super::RepositoryError;
use crate::extract::Page;
use crate::models::client::{Client, ClientUpdate, NewClient};
use crate::models::{clean, clean_opt};

const CLIENT_COLUMNS: &str = "id, first_name, last_name, email, phone, url, \
                              address1, address2, city, country, created_at, updated_at";

/// Repository for client database operations.
pub struct ClientRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ClientRepository<'a> {
    /// Create a new client repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List clients ordered by last then first name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, page: Page) -> Result<Vec<Client>, RepositoryError> {
        let rows = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients \
             ORDER BY last_name, first_name, id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Get a client by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ClientId) -> Result<Option<Client>, RepositoryError> {
        let row = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, input: &NewClient) -> Result<Client, RepositoryError> {
        sqlx::query_as::<_, Client>(&format!(
            "INSERT INTO clients \
                (first_name, last_name, email, phone, url, address1, address2, city, country) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(clean(&input.first_name))
        .bind(clean(&input.last_name))
        .bind(&input.email)
        .bind(clean(&input.phone))
        .bind(clean_opt(input.url.as_deref()))
        .bind(clean_opt(input.address1.as_deref()))
        .bind(clean_opt(input.address2.as_deref()))
        .bind(clean_opt(input.city.as_deref()))
        .bind(clean_opt(input.country.as_deref()))
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_write)
    }

    /// Update the supplied fields of a client.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the client does not exist.
    /// Returns `RepositoryError::Conflict` if the new email is taken.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(&self, id: ClientId, input: &ClientUpdate) -> Result<Client, RepositoryError> {
        sqlx::query_as::<_, Client>(&format!(
            "UPDATE clients SET \
                first_name = COALESCE($2, first_name), \
                last_name = COALESCE($3, last_name), \
                email = COALESCE($4, email), \
                phone = COALESCE($5, phone), \
                url = COALESCE($6, url), \
                address1 = COALESCE($7, address1), \
                address2 = COALESCE($8, address2), \
                city = COALESCE($9, city), \
                country = COALESCE($10, country), \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(id)
        .bind(input.first_name.as_deref().map(clean))
        .bind(input.last_name.as_deref().map(clean))
        .bind(input.email.as_ref())
        .bind(input.phone.as_deref().map(clean))
        .bind(clean_opt(input.url.as_deref()))
        .bind(clean_opt(input.address1.as_deref()))
        .bind(clean_opt(input.address2.as_deref()))
        .bind(clean_opt(input.city.as_deref()))
        .bind(clean_opt(input.country.as_deref()))
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::from_write)?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a client.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the client does not exist.
    /// Returns `RepositoryError::Conflict` if the client has orders.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ClientId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_delete(e, "client has orders and cannot be deleted"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
