//! Article repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use comptoir_core::{ArticleId, CategoryId, Discount};

use super::{RepositoryError, stock};
use crate::extract::Page;
use crate::models::article::{Article, ArticleDetail, ArticleFilter, ArticleUpdate, NewArticle};
use crate::models::category::CategorySummary;
use crate::models::{clean, clean_opt};

const ARTICLE_COLUMNS: &str = "id, code, designation, description, quantity, price, discount, \
                               category_id, image, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ArticleDetailRow {
    id: ArticleId,
    code: String,
    designation: String,
    description: Option<String>,
    quantity: i32,
    price: Decimal,
    discount: Option<Discount>,
    category_id: CategoryId,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_code: String,
    category_description: String,
}

impl From<ArticleDetailRow> for ArticleDetail {
    fn from(row: ArticleDetailRow) -> Self {
        let article = Article {
            id: row.id,
            code: row.code,
            designation: row.designation,
            description: row.description,
            quantity: row.quantity,
            price: row.price,
            discount: row.discount,
            category_id: row.category_id,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        Self {
            sale_price: article.sale_price(),
            category: CategorySummary {
                id: row.category_id,
                code: row.category_code,
                description: row.category_description,
            },
            article,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for article database operations.
pub struct ArticleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ArticleRepository<'a> {
    /// Create a new article repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List articles ordered by code, optionally filtered by category and
    /// by a case-insensitive search on code or designation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ArticleFilter) -> Result<Vec<Article>, RepositoryError> {
        let page = Page::new(filter.limit, filter.offset);
        let pattern = filter
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", escape_like(q)));

        let rows = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles \
             WHERE ($1::int IS NULL OR category_id = $1) \
               AND ($2::text IS NULL OR code ILIKE $2 OR designation ILIKE $2) \
             ORDER BY code LIMIT $3 OFFSET $4"
        ))
        .bind(filter.category_id)
        .bind(pattern)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Articles whose stock is at or below `threshold`, lowest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<Article>, RepositoryError> {
        let rows = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles \
             WHERE quantity <= $1 ORDER BY quantity, code"
        ))
        .bind(threshold)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Get an article by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ArticleId) -> Result<Option<Article>, RepositoryError> {
        let row = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Get an article by its code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Article>, RepositoryError> {
        let row = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE code = $1"
        ))
        .bind(code.trim())
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Get an article with its category joined.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_detail(&self, id: ArticleId) -> Result<Option<ArticleDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, ArticleDetailRow>(
            r"
            SELECT a.id, a.code, a.designation, a.description, a.quantity, a.price,
                   a.discount, a.category_id, a.image, a.created_at, a.updated_at,
                   c.code AS category_code, c.description AS category_description
            FROM articles a
            JOIN categories c ON c.id = a.category_id
            WHERE a.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create an article.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken.
    /// Returns `RepositoryError::InvalidReference` if the category does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, input: &NewArticle) -> Result<Article, RepositoryError> {
        sqlx::query_as::<_, Article>(&format!(
            "INSERT INTO articles \
                (code, designation, description, quantity, price, discount, category_id, image) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {ARTICLE_COLUMNS}"
        ))
        .bind(clean(&input.code))
        .bind(clean(&input.designation))
        .bind(clean_opt(input.description.as_deref()))
        .bind(input.quantity)
        .bind(input.price)
        .bind(input.discount)
        .bind(input.category_id)
        .bind(clean_opt(input.image.as_deref()))
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_write)
    }

    /// Update the supplied fields of an article.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the article does not exist.
    /// Returns `RepositoryError::Conflict` if the new code is taken.
    /// Returns `RepositoryError::InvalidReference` if the category does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: ArticleId,
        input: &ArticleUpdate,
    ) -> Result<Article, RepositoryError> {
        sqlx::query_as::<_, Article>(&format!(
            "UPDATE articles SET \
                code = COALESCE($2, code), \
                designation = COALESCE($3, designation), \
                description = COALESCE($4, description), \
                quantity = COALESCE($5, quantity), \
                price = COALESCE($6, price), \
                discount = COALESCE($7, discount), \
                category_id = COALESCE($8, category_id), \
                image = COALESCE($9, image), \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {ARTICLE_COLUMNS}"
        ))
        .bind(id)
        .bind(input.code.as_deref().map(clean))
        .bind(input.designation.as_deref().map(clean))
        .bind(clean_opt(input.description.as_deref()))
        .bind(input.quantity)
        .bind(input.price)
        .bind(input.discount)
        .bind(input.category_id)
        .bind(clean_opt(input.image.as_deref()))
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::from_write)?
        .ok_or(RepositoryError::NotFound)
    }

    /// Apply a manual stock correction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the article does not exist.
    /// Returns `RepositoryError::InsufficientStock` if stock would go negative.
    /// Returns `RepositoryError::Conflict` if stock would overflow.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn adjust_stock(&self, id: ArticleId, delta: i32) -> Result<Article, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        match stock::adjust(&mut tx, id, delta).await {
            Ok(_) => {}
            Err(RepositoryError::InvalidReference(_)) => return Err(RepositoryError::NotFound),
            Err(e) => return Err(e),
        }

        let article = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(article_id = %id, delta, quantity = article.quantity, "Manual stock adjustment");
        Ok(article)
    }

    /// Delete an article.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the article does not exist.
    /// Returns `RepositoryError::Conflict` while order or invoice lines reference it.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ArticleId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_delete(e, "article is referenced by order lines"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
