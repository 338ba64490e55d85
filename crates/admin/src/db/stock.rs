//! Article stock movements driven by orders.
//!
//! Client orders reserve stock (decrement) and supplier orders replenish it
//! (increment). Every write computes the net change per article between
//! what the order currently holds and what it should hold afterwards, then
//! applies those changes in article ID order inside the caller's
//! transaction. Decrements are conditional, so stock can never go negative.

use std::collections::BTreeMap;

use sqlx::PgConnection;

use comptoir_core::ArticleId;

use super::RepositoryError;

/// Which way an order's lines move stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockFlow {
    /// Client orders take units out of stock.
    Reserve,
    /// Supplier orders bring units into stock.
    Replenish,
}

/// Quantity per article, as produced by
/// [`merge_quantities`](crate::models::order::merge_quantities).
pub type Quantities = BTreeMap<ArticleId, i32>;

/// Net stock change per article when an order goes from holding `before`
/// to holding `after`.
///
/// Articles whose change nets to zero are left out. Pass an empty map for
/// `before` on creation and for `after` on deletion or cancellation.
#[must_use]
pub fn stock_deltas(flow: StockFlow, before: &Quantities, after: &Quantities) -> Quantities {
    let mut deltas = Quantities::new();

    for (article, qty) in before {
        *deltas.entry(*article).or_insert(0) -= qty;
    }
    for (article, qty) in after {
        *deltas.entry(*article).or_insert(0) += qty;
    }

    deltas.retain(|_, delta| *delta != 0);

    if flow == StockFlow::Reserve {
        for delta in deltas.values_mut() {
            *delta = -*delta;
        }
    }
    deltas
}

/// Apply stock changes inside an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::InsufficientStock` if a decrement would make
/// stock negative, `RepositoryError::InvalidReference` if an article does
/// not exist, and `RepositoryError::Database` if a query fails. The caller
/// must roll back on error.
pub async fn apply(conn: &mut PgConnection, deltas: &Quantities) -> Result<(), RepositoryError> {
    for (&article_id, &delta) in deltas {
        adjust(conn, article_id, delta).await?;
    }
    Ok(())
}

/// Move one article's stock by `delta`, keeping it within `0..=i32::MAX`.
///
/// Returns the new quantity.
///
/// # Errors
///
/// Returns `RepositoryError::InsufficientStock` if the result would be
/// negative, `RepositoryError::Conflict` if it would overflow,
/// `RepositoryError::InvalidReference` if the article does not exist, and
/// `RepositoryError::Database` if a query fails.
pub async fn adjust(
    conn: &mut PgConnection,
    article_id: ArticleId,
    delta: i32,
) -> Result<i32, RepositoryError> {
    let updated: Option<i32> = sqlx::query_scalar(
        "UPDATE articles SET quantity = quantity + $2, updated_at = now() \
         WHERE id = $1 AND quantity::bigint + $2 BETWEEN 0 AND 2147483647 \
         RETURNING quantity",
    )
    .bind(article_id)
    .bind(delta)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(quantity) = updated {
        tracing::debug!(article_id = %article_id, delta, quantity, "Stock adjusted");
        return Ok(quantity);
    }

    let available: Option<i32> = sqlx::query_scalar("SELECT quantity FROM articles WHERE id = $1")
        .bind(article_id)
        .fetch_optional(&mut *conn)
        .await?;

    match available {
        Some(available) => Err(refused(article_id, delta, available)),
        None => Err(RepositoryError::InvalidReference(format!(
            "article {article_id} does not exist"
        ))),
    }
}

/// Why a stock move on an existing article was not applied.
fn refused(article_id: ArticleId, delta: i32, available: i32) -> RepositoryError {
    if delta > 0 {
        return RepositoryError::Conflict(format!(
            "stock for article {article_id} cannot exceed {}",
            i32::MAX
        ));
    }
    RepositoryError::InsufficientStock {
        article_id,
        requested: delta.saturating_neg(),
        available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(pairs: &[(i32, i32)]) -> Quantities {
        pairs
            .iter()
            .map(|&(id, qty)| (ArticleId::new(id), qty))
            .collect()
    }

    #[test]
    fn test_reserve_on_create_decrements() {
        let deltas = stock_deltas(StockFlow::Reserve, &Quantities::new(), &q(&[(1, 3), (2, 1)]));
        assert_eq!(deltas, q(&[(1, -3), (2, -1)]));
    }

    #[test]
    fn test_replenish_on_create_increments() {
        let deltas = stock_deltas(StockFlow::Replenish, &Quantities::new(), &q(&[(4, 12)]));
        assert_eq!(deltas, q(&[(4, 12)]));
    }

    #[test]
    fn test_delete_reverts() {
        let before = q(&[(1, 3), (2, 1)]);
        assert_eq!(
            stock_deltas(StockFlow::Reserve, &before, &Quantities::new()),
            q(&[(1, 3), (2, 1)])
        );
        assert_eq!(
            stock_deltas(StockFlow::Replenish, &before, &Quantities::new()),
            q(&[(1, -3), (2, -1)])
        );
    }

    #[test]
    fn test_update_applies_net_change_only() {
        // Line for article 1 grows by 2, article 2 dropped, article 3 added,
        // article 4 unchanged.
        let before = q(&[(1, 3), (2, 1), (4, 5)]);
        let after = q(&[(1, 5), (3, 2), (4, 5)]);

        let deltas = stock_deltas(StockFlow::Reserve, &before, &after);
        assert_eq!(deltas, q(&[(1, -2), (2, 1), (3, -2)]));
        assert!(!deltas.contains_key(&ArticleId::new(4)));
    }

    #[test]
    fn test_refused_increment_is_a_conflict() {
        let err = refused(ArticleId::new(7), 10, i32::MAX - 3);
        assert!(matches!(err, RepositoryError::Conflict(ref msg) if msg.contains("cannot exceed")));
    }

    #[test]
    fn test_refused_decrement_reports_shortfall() {
        let err = refused(ArticleId::new(7), -5, 2);
        assert!(matches!(
            err,
            RepositoryError::InsufficientStock { requested: 5, available: 2, .. }
        ));
    }

    #[test]
    fn test_deltas_iterate_in_article_order() {
        let deltas = stock_deltas(
            StockFlow::Replenish,
            &Quantities::new(),
            &q(&[(9, 1), (2, 1), (5, 1)]),
        );
        let order: Vec<i32> = deltas.keys().map(ArticleId::as_i32).collect();
        assert_eq!(order, vec![2, 5, 9]);
    }
}
