//! Client order repository.
//!
//! Every write runs in one transaction: expedition resolution, line pricing,
//! the order rows and the stock reservation commit or roll back together.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use comptoir_core::{
    ArticleId, ClientId, ClientOrderId, ClientOrderLineId, Discount, Email, ExpeditionId,
    OrderStatus, discounted_price, order_total,
};

use super::stock::{self, Quantities, StockFlow, stock_deltas};
use super::{RepositoryError, check_transition, expeditions};
use crate::extract::Page;
use crate::models::client::ClientSummary;
use crate::models::client_order::{
    ClientOrder, ClientOrderFilter, ClientOrderLine, ClientOrderPatch, NewClientOrder,
};
use crate::models::expedition::ExpeditionSummary;
use crate::models::order::{ClientLineInput, StockLine, merge_quantities};
use crate::models::{clean, clean_opt};

const ORDER_SELECT: &str = r"
    SELECT o.id, o.code, o.order_date,
           o.client_id, c.first_name AS client_first_name, c.last_name AS client_last_name,
           c.email AS client_email,
           o.expedition_id, e.name AS expedition_name, e.cost AS expedition_cost,
           o.delivery_note, o.payment_method, o.tracking_code, o.status, o.free_shipping,
           o.total, o.created_at, o.updated_at
    FROM client_orders o
    JOIN clients c ON c.id = o.client_id
    JOIN expeditions e ON e.id = o.expedition_id
";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ClientOrderRow {
    id: ClientOrderId,
    code: String,
    order_date: DateTime<Utc>,
    client_id: ClientId,
    client_first_name: String,
    client_last_name: String,
    client_email: Email,
    expedition_id: ExpeditionId,
    expedition_name: String,
    expedition_cost: Decimal,
    delivery_note: Option<String>,
    payment_method: String,
    tracking_code: Option<String>,
    status: OrderStatus,
    free_shipping: bool,
    total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ClientOrderRow {
    fn into_order(self, lines: Vec<ClientOrderLine>) -> ClientOrder {
        ClientOrder {
            id: self.id,
            code: self.code,
            order_date: self.order_date,
            client: ClientSummary {
                id: self.client_id,
                first_name: self.client_first_name,
                last_name: self.client_last_name,
                email: self.client_email,
            },
            expedition: ExpeditionSummary {
                id: self.expedition_id,
                name: self.expedition_name,
                cost: self.expedition_cost,
            },
            delivery_note: self.delivery_note,
            payment_method: self.payment_method,
            tracking_code: self.tracking_code,
            status: self.status,
            free_shipping: self.free_shipping,
            total: self.total,
            lines,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ClientOrderLineRow {
    id: ClientOrderLineId,
    order_id: ClientOrderId,
    article_id: ArticleId,
    article_code: String,
    designation: String,
    quantity: i32,
    unit_price: Decimal,
    amount: Decimal,
}

impl From<ClientOrderLineRow> for ClientOrderLine {
    fn from(row: ClientOrderLineRow) -> Self {
        Self {
            id: row.id,
            article_id: row.article_id,
            article_code: row.article_code,
            designation: row.designation,
            quantity: row.quantity,
            unit_price: row.unit_price,
            amount: row.amount,
        }
    }
}

/// Locked order header used by updates and deletes.
#[derive(Debug, sqlx::FromRow)]
struct OrderHeader {
    code: String,
    order_date: DateTime<Utc>,
    client_id: ClientId,
    expedition_id: ExpeditionId,
    delivery_note: Option<String>,
    payment_method: String,
    tracking_code: Option<String>,
    status: OrderStatus,
    free_shipping: bool,
    total: Decimal,
}

/// A line with its unit price settled.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
struct PricedLine {
    article_id: ArticleId,
    quantity: i32,
    unit_price: Decimal,
}

impl StockLine for PricedLine {
    fn article_id(&self) -> ArticleId {
        self.article_id
    }

    fn quantity(&self) -> i32 {
        self.quantity
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for client order database operations.
pub struct ClientOrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ClientOrderRepository<'a> {
    /// Create a new client order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List orders, newest first, with client, expedition and lines joined.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, filter: &ClientOrderFilter) -> Result<Vec<ClientOrder>, RepositoryError> {
        let page = Page::new(filter.limit, filter.offset);
        let rows = sqlx::query_as::<_, ClientOrderRow>(&format!(
            "{ORDER_SELECT} \
             WHERE ($1::int IS NULL OR o.client_id = $1) \
               AND ($2::order_status IS NULL OR o.status = $2) \
             ORDER BY o.order_date DESC, o.id DESC \
             LIMIT $3 OFFSET $4"
        ))
        .bind(filter.client_id)
        .bind(filter.status)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        self.attach_lines(rows).await
    }

    /// Get one order with client, expedition and lines joined.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: ClientOrderId) -> Result<Option<ClientOrder>, RepositoryError> {
        let row = sqlx::query_as::<_, ClientOrderRow>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
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
        rows: Vec<ClientOrderRow>,
    ) -> Result<Vec<ClientOrder>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<ClientOrderId> = rows.iter().map(|r| r.id).collect();

        let line_rows = sqlx::query_as::<_, ClientOrderLineRow>(
            r"
            SELECT l.id, l.order_id, l.article_id, a.code AS article_code, a.designation,
                   l.quantity, l.unit_price, l.quantity * l.unit_price AS amount
            FROM client_order_lines l
            JOIN articles a ON a.id = l.article_id
            WHERE l.order_id = ANY($1)
            ORDER BY l.order_id, l.id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<ClientOrderId, Vec<ClientOrderLine>> = HashMap::new();
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

    /// Create an order, reserving stock for its lines unless it is created
    /// already cancelled.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if an article or the
    /// expedition does not exist.
    /// Returns `RepositoryError::InsufficientStock` if a line cannot be served.
    /// Returns `RepositoryError::Conflict` if the code is taken.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(&self, input: &NewClientOrder) -> Result<ClientOrder, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let expedition = expeditions::resolve(&mut tx, &input.expedition).await?;
        let lines = price_lines(&mut tx, &input.lines).await?;
        let total = order_total(
            lines.iter().map(|l| (l.quantity, l.unit_price)),
            expedition.cost,
            input.free_shipping,
        )?;

        let id: ClientOrderId = sqlx::query_scalar(
            r"
            INSERT INTO client_orders
                (code, order_date, client_id, expedition_id, delivery_note, payment_method,
                 tracking_code, status, free_shipping, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            ",
        )
        .bind(clean(&input.code))
        .bind(input.order_date)
        .bind(input.client_id)
        .bind(expedition.id)
        .bind(clean_opt(input.delivery_note.as_deref()))
        .bind(clean(&input.payment_method))
        .bind(clean_opt(input.tracking_code.as_deref()))
        .bind(input.status)
        .bind(input.free_shipping)
        .bind(total)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        insert_lines(&mut tx, id, &lines).await?;

        if input.status.holds_stock() {
            let deltas = stock_deltas(StockFlow::Reserve, &Quantities::new(), &merge_quantities(&lines));
            stock::apply(&mut tx, &deltas).await?;
        }

        tx.commit().await?;

        tracing::info!(order_id = %id, code = %input.code, %total, "Client order created");
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Apply a partial update.
    ///
    /// New lines replace the old ones and only the net stock change is
    /// applied. Cancelling releases the order's stock. The total is
    /// recomputed when lines, expedition or free shipping change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Conflict` for a forbidden status change, a
    /// duplicate code, or an invoiced order being cancelled or repriced.
    /// Returns `RepositoryError::InvalidReference` if an article or the
    /// expedition does not exist.
    /// Returns `RepositoryError::InvalidValue` if the total would not fit.
    /// Returns `RepositoryError::InsufficientStock` if new lines cannot be served.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update(
        &self,
        id: ClientOrderId,
        patch: &ClientOrderPatch,
    ) -> Result<ClientOrder, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = lock_header(&mut tx, id).await?;
        let status = patch.status.unwrap_or(current.status);
        check_transition(current.status, status)?;
        if patch.breaks_invoice(current.status) && is_invoiced(&mut tx, id).await? {
            return Err(RepositoryError::Conflict(
                "an invoiced order cannot be cancelled or repriced".to_owned(),
            ));
        }
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
            Some(input) => {
                let priced = price_lines(&mut tx, input).await?;
                sqlx::query("DELETE FROM client_order_lines WHERE order_id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                insert_lines(&mut tx, id, &priced).await?;
                priced
            }
            None => old_lines.clone(),
        };

        let before = held_quantities(current.status, &old_lines);
        let after = held_quantities(status, &new_lines);
        stock::apply(&mut tx, &stock_deltas(StockFlow::Reserve, &before, &after)).await?;

        let free_shipping = patch.free_shipping.unwrap_or(current.free_shipping);
        let total = if patch.affects_total() {
            order_total(
                new_lines.iter().map(|l| (l.quantity, l.unit_price)),
                expedition.cost,
                free_shipping,
            )?
        } else {
            current.total
        };

        sqlx::query(
            r"
            UPDATE client_orders SET
                code = $2, order_date = $3, client_id = $4, expedition_id = $5,
                delivery_note = $6, payment_method = $7, tracking_code = $8,
                status = $9, free_shipping = $10, total = $11, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(patch.code.as_deref().map_or(current.code, clean))
        .bind(patch.order_date.unwrap_or(current.order_date))
        .bind(patch.client_id.unwrap_or(current.client_id))
        .bind(expedition.id)
        .bind(clean_opt(patch.delivery_note.as_deref()).or(current.delivery_note))
        .bind(patch.payment_method.as_deref().map_or(current.payment_method, clean))
        .bind(clean_opt(patch.tracking_code.as_deref()).or(current.tracking_code))
        .bind(status)
        .bind(free_shipping)
        .bind(total)
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        tx.commit().await?;

        if status != current.status {
            tracing::info!(order_id = %id, from = %current.status, to = %status, "Client order status changed");
        }
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete an order, restoring the stock it still holds.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Conflict` if the order has been invoiced.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn delete(&self, id: ClientOrderId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = lock_header(&mut tx, id).await?;
        let lines = load_lines(&mut tx, id).await?;
        let before = held_quantities(current.status, &lines);
        stock::apply(
            &mut tx,
            &stock_deltas(StockFlow::Reserve, &before, &Quantities::new()),
        )
        .await?;

        sqlx::query("DELETE FROM client_orders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_delete(e, "order has an invoice and cannot be deleted"))?;

        tx.commit().await?;

        tracing::info!(order_id = %id, "Client order deleted");
        Ok(())
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

fn held_quantities(status: OrderStatus, lines: &[PricedLine]) -> Quantities {
    if status.holds_stock() {
        merge_quantities(lines)
    } else {
        Quantities::new()
    }
}

async fn lock_header(
    conn: &mut PgConnection,
    id: ClientOrderId,
) -> Result<OrderHeader, RepositoryError> {
    sqlx::query_as::<_, OrderHeader>(
        r"
        SELECT code, order_date, client_id, expedition_id, delivery_note, payment_method,
               tracking_code, status, free_shipping, total
        FROM client_orders
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)
}

async fn is_invoiced(conn: &mut PgConnection, id: ClientOrderId) -> Result<bool, RepositoryError> {
    let invoiced = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM client_invoices WHERE order_id = $1)",
    )
    .bind(id)
    .fetch_one(conn)
    .await?;

    Ok(invoiced)
}

async fn load_lines(
    conn: &mut PgConnection,
    id: ClientOrderId,
) -> Result<Vec<PricedLine>, RepositoryError> {
    let lines = sqlx::query_as::<_, PricedLine>(
        "SELECT article_id, quantity, unit_price FROM client_order_lines \
         WHERE order_id = $1 ORDER BY id",
    )
    .bind(id)
    .fetch_all(conn)
    .await?;

    Ok(lines)
}

/// Price each line at its article's current discounted price.
async fn price_lines(
    conn: &mut PgConnection,
    input: &[ClientLineInput],
) -> Result<Vec<PricedLine>, RepositoryError> {
    let ids: Vec<ArticleId> = input.iter().map(|l| l.article_id).collect();

    let prices: HashMap<ArticleId, Decimal> =
        sqlx::query_as::<_, (ArticleId, Decimal, Option<Discount>)>(
            "SELECT id, price, discount FROM articles WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(conn)
        .await?
        .into_iter()
        .map(|(id, price, discount)| (id, discounted_price(price, discount)))
        .collect();

    input
        .iter()
        .map(|line| {
            let unit_price = prices.get(&line.article_id).copied().ok_or_else(|| {
                RepositoryError::InvalidReference(format!(
                    "article {} does not exist",
                    line.article_id
                ))
            })?;
            Ok(PricedLine {
                article_id: line.article_id,
                quantity: line.quantity,
                unit_price,
            })
        })
        .collect()
}

async fn insert_lines(
    conn: &mut PgConnection,
    order_id: ClientOrderId,
    lines: &[PricedLine],
) -> Result<(), RepositoryError> {
    let article_ids: Vec<ArticleId> = lines.iter().map(|l| l.article_id).collect();
    let quantities: Vec<i32> = lines.iter().map(|l| l.quantity).collect();
    let unit_prices: Vec<Decimal> = lines.iter().map(|l| l.unit_price).collect();

    sqlx::query(
        r"
        INSERT INTO client_order_lines (order_id, article_id, quantity, unit_price)
        SELECT $1, line.article_id, line.quantity, line.unit_price
        FROM UNNEST($2::int[], $3::int[], $4::numeric[])
            AS line(article_id, quantity, unit_price)
        ",
    )
    .bind(order_id)
    .bind(&article_ids)
    .bind(&quantities)
    .bind(&unit_prices)
    .execute(conn)
    .await
    .map_err(RepositoryError::from_write)?;

    Ok(())
}
