//! Low-stock report.

use tracing::{info, warn};

use comptoir_admin::db::ArticleRepository;

use super::{CommandError, connect};

/// Log every article whose stock is at or below `threshold`.
///
/// # Errors
///
/// Returns an error if the database cannot be reached.
pub async fn run(threshold: i32) -> Result<(), CommandError> {
    let pool = connect().await?;
    let articles = ArticleRepository::new(&pool).low_stock(threshold).await?;

    if articles.is_empty() {
        info!(threshold, "No article at or below the threshold");
        return Ok(());
    }

    info!(threshold, count = articles.len(), "Low stock report");
    for article in &articles {
        if article.quantity == 0 {
            warn!(code = %article.code, designation = %article.designation, "Out of stock");
        } else {
            info!(
                code = %article.code,
                designation = %article.designation,
                quantity = article.quantity,
                "Low stock"
            );
        }
    }
    Ok(())
}
