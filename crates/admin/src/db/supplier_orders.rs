//! Supplier order repository.
//!
//! Mirrors client orders with the stock flow reversed: lines replenish
//! stock, and reverting them is a conditional decrement that fails once the
//! delivered units have been sold.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use comptoir_core::{
    ArticleId, CategoryId, Email, ExpeditionId, OrderStatus, SupplierId, SupplierOrderId,
    SupplierOrderLineId, order_total,
};

use super::stock::{self, Quantities, StockFlow, stock_deltas};
use super::{RepositoryError, check_transition, expeditions};
use crate::extract::Page;
use crate::models::expedition::ExpeditionSummary;
use crate::models::order::{SupplierLineInput, merge_quantities};
use crate::models::supplier::SupplierSummary;
use crate::models::supplier_order::{
    NewSupplierOrder, SupplierOrder, SupplierOrderFilter, SupplierOrderLine, SupplierOrderPatch,
};
use crate::models::{clean, clean_opt};

const ORDER_SELECT: &str = r"
    SELECT o.id, o.code, o.order_date,
           o.supplier_id, s.first_name AS supplier_first_name,
           s.last_name AS supplier_last_name, s.email AS supplier_email,
           o.expedition_id, e.name AS expedition_name, e.cost AS expedition_cost,
           o.delivery_note, o.payment_method, o.category_id, o.note, o.status,
           o.total, o.created_at, o.updated_at
    FROM supplier_orders o
    JOIN suppliers s ON s.id = o.supplier_id
    JOIN expeditions e ON e.id = o.expedition_id
";

#[derive(Debug, sqlx::FromRow)]
struct SupplierOrderRow {
    id: SupplierOrderId,
    code: String,
    order_date: DateTime<Utc>,
    supplier_id: SupplierId,
    supplier_first_name: String,
    supplier_last_name: String,
    supplier_email: Email,
    expedition_id: ExpeditionId,
    expedition_name: String,
    expedition_cost: Decimal,
    delivery_note: Option<String>,
    payment_method: String,
    category_id: Option<CategoryId>,
    note: Option<String>,
    status: OrderStatus,
    total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SupplierOrderRow {
    fn into_order(self, lines: Vec<SupplierOrderLine>) -> SupplierOrder {
        SupplierOrder {
            id: self.id,
            code: self.code,
            order_date: self.order_date,
            supplier: SupplierSummary {
                id: self.supplier_id,
                first_name: self.supplier_first_name,
                last_name: self.supplier_last_name,
                email: self.supplier_email,
            },
            expedition: ExpeditionSummary {
                id: self.expedition_id,
                name: self.expedition_name,
                cost: self.expedition_cost,
            },
            delivery_note: self.delivery_note,
            payment_method: self.payment_method,
            category_id: self.category_id,
            note: self.note,
            status: self.status,
            total: self.total,
            lines,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SupplierOrderLineRow {
    id: SupplierOrderLineId,
    order_id: SupplierOrderId,
    article_id: ArticleId,
    article_code: String,
    designation: String,
    quantity: i32,
    unit_cost: Decimal,
    amount: Decimal,
}

impl From<SupplierOrderLineRow> for SupplierOrderLine {
    fn from(row: SupplierOrderLineRow) -> Self {
        Self {
            id: row.id,
            article_id: row.article_id,
            article_code: row.article_code,
            designation: row.designation,
            quantity: row.quantity,
            unit_cost: row.unit_cost,
            amount: row.amount,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderHeader {
    code: String,
    order_date: DateTime<Utc>,
    supplier_id: SupplierId,
    expedition_id: ExpeditionId,
    delivery_note: Option<String>,
    payment_method: String,
    category_id: Option<CategoryId>,
    note: Option<String>,
    status: OrderStatus,
    total: Decimal,
}

/// Repository for supplier order database operations.
pub struct SupplierOrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SupplierOrderRepository<'a> {
    /// Create a new supplier order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List orders, newest first, with supplier, expedition and lines joined.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &SupplierOrderFilter,
    ) -> Result<Vec<SupplierOrder>, RepositoryError> {
        let page = Page::new(filter.limit, filter.offset);
        let rows = sqlx::query_as::<_, SupplierOrderRow>(&format!(
            "{ORDER_SELECT} \
             WHERE ($1::int IS NULL OR o.supplier_id = $1) \
               AND ($2::order_status IS NULL OR o.status = $2) \
             ORDER BY o.order_date DESC, o.id DESC \
             LIMIT $3 OFFSET $4"
        ))
        .bind(filter.supplier_id)
        .bind(filter.status)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        self.attach_lines(rows).await
    }

    /// Get one order with supplier, expedition and lines joined.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: SupplierOrderId) -> Result<Option<SupplierOrder>, RepositoryError> {
        let row =
            sqlx::query_as::<_, SupplierOrderRow>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.attach_lines(vec![row]).await?.pop())
    }

    async fn attach_lines(
        &self,
        rows: Vec<SupplierOrderRow>,
    ) -> Result<Vec<SupplierOrder>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<SupplierOrderId> = rows.iter().map(|r| r.id).collect();

        let line_rows = sqlx::query_as::<_, SupplierOrderLineRow>(
            r"
            SELECT l.id, l.order_id, l.article_id, a.code AS article_code, a.designation,
                   l.quantity, l.unit_cost, l.quantity * l.unit_cost AS amount
            FROM supplier_order_lines l
            JOIN articles a ON a.id = l.article_id
            WHERE l.order_id = ANY($1)
            ORDER BY l.order_id, l.id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<SupplierOrderId, Vec<SupplierOrderLine>> = HashMap::new();
        for line in line_rows {
            by_order.entry(line.order_id).or_default().push(line.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let lines = by_order.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect())
    }

    /// Create an order and replenish stock for its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if an article, the category
    /// or the expedition does not exist.
    /// Returns `RepositoryError::Conflict` if the code is taken.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(&self, input: &NewSupplierOrder) -> Result<SupplierOrder, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let expedition = expeditions::resolve(&mut tx, &input.expedition).await?;
        let total = order_total(
            input.lines.iter().map(|l| (l.quantity, l.unit_cost)),
            expedition.cost,
            false,
        )?;

        let id: SupplierOrderId = sqlx::query_scalar(
            r"
            INSERT INTO supplier_orders
                (code, order_date, supplier_id, expedition_id, delivery_note, payment_method,
                 category_id, note, status, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            ",
        )
        .bind(clean(&input.code))
        .bind(input.order_date)
        .bind(input.supplier_id)
        .bind(expedition.id)
        .bind(clean_opt(input.delivery_note.as_deref()))
        .bind(clean(&input.payment_method))
        .bind(input.category_id)
        .bind(clean_opt(input.note.as_deref()))
        .bind(input.status)
        .bind(total)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        insert_lines(&mut tx, id, &input.lines).await?;

        if input.status.holds_stock() {
            let deltas = stock_deltas(
                StockFlow::Replenish,
                &Quantities::new(),
                &merge_quantities(&input.lines),
            );
            stock::apply(&mut tx, &deltas).await?;
        }

        tx.commit().await?;

        tracing::info!(order_id = %id, code = %input.code, %total, "Supplier order created");
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Apply a partial update with the same line and status rules as client
    /// orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Conflict` for a forbidden status change or a
    /// duplicate code.
    /// Returns `RepositoryError::InsufficientStock` if removing replenished
    /// units would make stock negative.
    /// Returns `RepositoryError::InvalidReference` if an article, the category
    /// or the expedition does not exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update(
        &self,
        id: SupplierOrderId,
        patch: &SupplierOrderPatch,
    ) -> Result<SupplierOrder, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = lock_header(&mut tx, id).await?;
        let status = patch.status.unwrap_or(current.status);
        check_transition(current.status, status)?;
        if current.status == OrderStatus::Cancelled && patch.lines.is_some() {
            return Err(RepositoryError::Conflict(
                "lines of a cancelled order cannot be changed".to_owned(),
            ));
        }

        let expedition = match &patch.expedition {
            Some(expedition) => expeditions::resolve(&mut tx, expedition).await?,
            None => expeditions::load_summary(&mut tx, current.expedition_id).await?,
        };

        let old_lines = load_lines(&mut tx, id).await?;
        let new_lines = match &patch.lines {
            Some(lines) => {
                sqlx::query("DELETE FROM supplier_order_lines WHERE order_id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                insert_lines(&mut tx, id, lines).await?;
                lines.clone()
            }
            None => old_lines.clone(),
        };

        let before = held_quantities(current.status, &old_lines);
        let after = held_quantities(status, &new_lines);
        stock::apply(&mut tx, &stock_deltas(StockFlow::Replenish, &before, &after)).await?;

        let total = if patch.affects_total() {
            order_total(
                new_lines.iter().map(|l| (l.quantity, l.unit_cost)),
                expedition.cost,
                false,
            )?
        } else {
            current.total
        };

        sqlx::query(
            r"
            UPDATE supplier_orders SET
                code = $2, order_date = $3, supplier_id = $4, expedition_id = $5,
                delivery_note = $6, payment_method = $7, category_id = $8, note = $9,
                status = $10, total = $11, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(patch.code.as_deref().map_or(current.code, clean))
        .bind(patch.order_date.unwrap_or(current.order_date))
        .bind(patch.supplier_id.unwrap_or(current.supplier_id))
        .bind(expedition.id)
        .bind(clean_opt(patch.delivery_note.as_deref()).or(current.delivery_note))
        .bind(patch.payment_method.as_deref().map_or(current.payment_method, clean))
        .bind(patch.category_id.or(current.category_id))
        .bind(clean_opt(patch.note.as_deref()).or(current.note))
        .bind(status)
        .bind(total)
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        tx.commit().await?;

        if status != current.status {
            tracing::info!(order_id = %id, from = %current.status, to = %status, "Supplier order status changed");
        }
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete an order, taking back the stock it delivered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::InsufficientStock` if the delivered units
    /// have already left stock.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn delete(&self, id: SupplierOrderId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = lock_header(&mut tx, id).await?;
        let lines = load_lines(&mut tx, id).await?;
        let before = held_quantities(current.status, &lines);
        stock::apply(
            &mut tx,
            &stock_deltas(StockFlow::Replenish, &before, &Quantities::new()),
        )
        .await?;

        sqlx::query("DELETE FROM supplier_orders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(order_id = %id, "Supplier order deleted");
        Ok(())
    }
}

fn held_quantities(status: OrderStatus, lines: &[SupplierLineInput]) -> Quantities {
    if status.holds_stock() {
        merge_quantities(lines)
    } else {
        Quantities::new()
    }
}

async fn lock_header(
    conn: &mut PgConnection,
    id: SupplierOrderId,
) -> Result<OrderHeader, RepositoryError> {
    sqlx::query_as::<_, OrderHeader>(
        r"
        SELECT code, order_date, supplier_id, expedition_id, delivery_note, payment_method,
               category_id, note, status, total
        FROM supplier_orders
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)
}

async fn load_lines(
    conn: &mut PgConnection,
    id: SupplierOrderId,
) -> Result<Vec<SupplierLineInput>, RepositoryError> {
    let rows = sqlx::query_as::<_, (ArticleId, i32, Decimal)>(
        "SELECT article_id, quantity, unit_cost FROM supplier_order_lines \
         WHERE order_id = $1 ORDER BY id",
    )
    .bind(id)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(article_id, quantity, unit_cost)| SupplierLineInput {
            article_id,
            quantity,
            unit_cost,
        })
        .collect())
}

async fn insert_lines(
    conn: &mut PgConnection,
    order_id: SupplierOrderId,
    lines: &[SupplierLineInput],
) -> Result<(), RepositoryError> {
    let article_ids: Vec<ArticleId> = lines.iter().map(|l| l.article_id).collect();
    let quantities: Vec<i32> = lines.iter().map(|l| l.quantity).collect();
    let unit_costs: Vec<Decimal> = lines.iter().map(|l| l.unit_cost).collect();

    sqlx::query(
        r"
        INSERT INTO supplier_order_lines (order_id, article_id, quantity, unit_cost)
        SELECT $1, line.article_id, line.quantity, line.unit_cost
        FROM UNNEST($2::int[], $3::int[], $4::numeric[])
            AS line(article_id, quantity, unit_cost)
        ",
    )
    .bind(order_id)
    .bind(&article_ids)
    .bind(&quantities)
    .bind(&unit_costs)
    .execute(conn)
    .await
    .map_err(RepositoryError::from_write)?;

    Ok(())
}
