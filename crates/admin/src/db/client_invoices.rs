//! Client invoice repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use comptoir_core::{
    ArticleId, ClientId, ClientInvoiceId, ClientInvoiceLineId, ClientOrderId, Email, OrderStatus,
    line_amount,
};

use super::RepositoryError;
use crate::models::client::ClientSummary;
use crate::models::invoice::{ClientInvoice, ClientInvoiceLine};

const INVOICE_SELECT: &str = r"
    SELECT i.id, i.order_id, o.code AS order_code, o.order_date,
           c.id AS client_id, c.first_name AS client_first_name,
           c.last_name AS client_last_name, c.email AS client_email,
           i.total, i.created_at, i.updated_at
    FROM client_invoices i
    JOIN client_orders o ON o.id = i.order_id
    JOIN clients c ON c.id = o.client_id
";

#[derive(Debug, sqlx::FromRow)]
struct ClientInvoiceRow {
    id: ClientInvoiceId,
    order_id: ClientOrderId,
    order_code: String,
    order_date: DateTime<Utc>,
    client_id: ClientId,
    client_first_name: String,
    client_last_name: String,
    client_email: Email,
    total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ClientInvoiceLineRow {
    id: ClientInvoiceLineId,
    article_id: ArticleId,
    designation: String,
    quantity: i32,
    unit_price: Decimal,
    amount: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct InvoicedOrder {
    status: OrderStatus,
    total: Decimal,
}

/// Repository for client invoice database operations.
pub struct ClientInvoiceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ClientInvoiceRepository<'a> {
    /// Create a new client invoice repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an invoice by ID with order, client and line designations joined.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: ClientInvoiceId) -> Result<Option<ClientInvoice>, RepositoryError> {
        let row =
            sqlx::query_as::<_, ClientInvoiceRow>(&format!("{INVOICE_SELECT} WHERE i.id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        match row {
            Some(row) => Ok(Some(self.with_lines(row).await?)),
            None => Ok(None),
        }
    }

    /// Get the invoice issued for a client order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_order(
        &self,
        order_id: ClientOrderId,
    ) -> Result<Option<ClientInvoice>, RepositoryError> {
        let row = sqlx::query_as::<_, ClientInvoiceRow>(&format!(
            "{INVOICE_SELECT} WHERE i.order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.with_lines(row).await?)),
            None => Ok(None),
        }
    }

    async fn with_lines(&self, row: ClientInvoiceRow) -> Result<ClientInvoice, RepositoryError> {
        let lines = sqlx::query_as::<_, ClientInvoiceLineRow>(
            r"
            SELECT l.id, l.article_id, a.designation, l.quantity, l.unit_price, l.amount
            FROM client_invoice_lines l
            JOIN articles a ON a.id = l.article_id
            WHERE l.invoice_id = $1
            ORDER BY l.id
            ",
        )
        .bind(row.id)
        .fetch_all(self.pool)
        .await?;

        Ok(ClientInvoice {
            id: row.id,
            order_id: row.order_id,
            order_code: row.order_code,
            order_date: row.order_date,
            client: ClientSummary {
                id: row.client_id,
                first_name: row.client_first_name,
                last_name: row.client_last_name,
                email: row.client_email,
            },
            lines: lines
                .into_iter()
                .map(|l| ClientInvoiceLine {
                    id: l.id,
                    article_id: l.article_id,
                    designation: l.designation,
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                    amount: l.amount,
                })
                .collect(),
            total: row.total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    /// Issue the invoice for a client order, copying its lines and total.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Conflict` if the order is cancelled or
    /// already invoiced.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create_for_order(
        &self,
        order_id: ClientOrderId,
    ) -> Result<ClientInvoice, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, InvoicedOrder>(
            "SELECT status, total FROM client_orders WHERE id = $1 FOR UPDATE",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if order.status == OrderStatus::Cancelled {
            return Err(RepositoryError::Conflict(
                "cannot invoice a cancelled order".to_owned(),
            ));
        }

        let invoice_id: ClientInvoiceId = sqlx::query_scalar(
            "INSERT INTO client_invoices (order_id, total) VALUES ($1, $2) RETURNING id",
        )
        .bind(order_id)
        .bind(order.total)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        let order_lines = sqlx::query_as::<_, (ArticleId, i32, Decimal)>(
            "SELECT article_id, quantity, unit_price FROM client_order_lines \
             WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        let article_ids: Vec<ArticleId> = order_lines.iter().map(|l| l.0).collect();
        let quantities: Vec<i32> = order_lines.iter().map(|l| l.1).collect();
        let unit_prices: Vec<Decimal> = order_lines.iter().map(|l| l.2).collect();
        let amounts: Vec<Decimal> = order_lines
            .iter()
            .map(|&(_, quantity, unit_price)| line_amount(quantity, unit_price))
            .collect::<Result<_, _>>()?;

        sqlx::query(
            r"
            INSERT INTO client_invoice_lines (invoice_id, article_id, quantity, unit_price, amount)
            SELECT $1, line.article_id, line.quantity, line.unit_price, line.amount
            FROM UNNEST($2::int[], $3::int[], $4::numeric[], $5::numeric[])
                AS line(article_id, quantity, unit_price, amount)
            ",
        )
        .bind(invoice_id)
        .bind(&article_ids)
        .bind(&quantities)
        .bind(&unit_prices)
        .bind(&amounts)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(invoice_id = %invoice_id, order_id = %order_id, total = %order.total, "Client invoice issued");
        self.get(invoice_id).await?.ok_or(RepositoryError::NotFound)
    }
}
