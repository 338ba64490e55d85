//! Expedition repository.
//!
//! Besides plain CRUD this resolves an order's [`ExpeditionRef`] inside the
//! order's transaction, creating inline expeditions on the way.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use comptoir_core::ExpeditionId;

use super::RepositoryError;
use crate::extract::Page;
use crate::models::clean;
use crate::models::expedition::{Expedition, ExpeditionSummary, ExpeditionUpdate, NewExpedition};
use crate::models::order::ExpeditionRef;

const EXPEDITION_COLUMNS: &str = "id, name, cost, created_at, updated_at";

/// Repository for expedition database operations.
pub struct ExpeditionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ExpeditionRepository<'a> {
    /// Create a new expedition repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List expeditions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, page: Page) -> Result<Vec<Expedition>, RepositoryError> {
        let rows = sqlx::query_as::<_, Expedition>(&format!(
            "SELECT {EXPEDITION_COLUMNS} FROM expeditions \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Get an expedition by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ExpeditionId) -> Result<Option<Expedition>, RepositoryError> {
        let row = sqlx::query_as::<_, Expedition>(&format!(
            "SELECT {EXPEDITION_COLUMNS} FROM expeditions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Get the oldest expedition with the given name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Expedition>, RepositoryError> {
        let row = sqlx::query_as::<_, Expedition>(&format!(
            "SELECT {EXPEDITION_COLUMNS} FROM expeditions WHERE name = $1 ORDER BY id LIMIT 1"
        ))
        .bind(name.trim())
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create an expedition.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, input: &NewExpedition) -> Result<Expedition, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, input).await
    }

    /// Update the supplied fields of an expedition.
    ///
    /// Totals of existing orders are not recomputed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the expedition does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: ExpeditionId,
        input: &ExpeditionUpdate,
    ) -> Result<Expedition, RepositoryError> {
        sqlx::query_as::<_, Expedition>(&format!(
            "UPDATE expeditions SET \
                name = COALESCE($2, name), \
                cost = COALESCE($3, cost), \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {EXPEDITION_COLUMNS}"
        ))
        .bind(id)
        .bind(input.name.as_deref().map(clean))
        .bind(input.cost)
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::from_write)?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete an expedition.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the expedition does not exist.
    /// Returns `RepositoryError::Conflict` while orders still use it.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ExpeditionId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM expeditions WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_delete(e, "expedition is still used by orders"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

async fn insert(
    conn: &mut PgConnection,
    input: &NewExpedition,
) -> Result<Expedition, RepositoryError> {
    sqlx::query_as::<_, Expedition>(&format!(
        "INSERT INTO expeditions (name, cost) VALUES ($1, $2) RETURNING {EXPEDITION_COLUMNS}"
    ))
    .bind(clean(&input.name))
    .bind(input.cost)
    .fetch_one(conn)
    .await
    .map_err(RepositoryError::from_write)
}

/// Resolve an order's expedition to an ID and its current cost.
///
/// # Errors
///
/// Returns `RepositoryError::InvalidReference` if an ID does not exist.
/// Returns `RepositoryError::Database` if the query fails.
pub(crate) async fn resolve(
    conn: &mut PgConnection,
    expedition: &ExpeditionRef,
) -> Result<ExpeditionSummary, RepositoryError> {
    match expedition {
        ExpeditionRef::Existing(id) => load_summary(conn, *id).await,
        ExpeditionRef::Inline(new) => {
            let created = insert(conn, new).await?;
            tracing::info!(expedition_id = %created.id, name = %created.name, "Created inline expedition");
            Ok(ExpeditionSummary {
                id: created.id,
                name: created.name,
                cost: created.cost,
            })
        }
    }
}

/// Load an expedition referenced by an order.
///
/// # Errors
///
/// Returns `RepositoryError::InvalidReference` if the ID does not exist.
/// Returns `RepositoryError::Database` if the query fails.
pub(crate) async fn load_summary(
    conn: &mut PgConnection,
    id: ExpeditionId,
) -> Result<ExpeditionSummary, RepositoryError> {
    let row = sqlx::query_as::<_, (ExpeditionId, String, Decimal)>(
        "SELECT id, name, cost FROM expeditions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| RepositoryError::InvalidReference(format!("expedition {id} does not exist")))?;

    Ok(ExpeditionSummary {
        id: row.0,
        name: row.1,
        cost: row.2,
    })
}
