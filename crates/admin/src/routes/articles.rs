//! Article route handlers, including stock corrections.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use comptoir_core::ArticleId;

use super::{Deleted, or_not_found};
use crate::db::ArticleRepository;
use crate::error::AppError;
use crate::extract::{PathParam, QueryParams, Validated};
use crate::models::article::{
    Article, ArticleDetail, ArticleFilter, ArticleUpdate, DEFAULT_LOW_STOCK_THRESHOLD,
    LowStockQuery, NewArticle, StockAdjustment,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/articles", get(index).post(create))
        .route("/api/articles/low-stock", get(low_stock))
        .route("/api/articles/{id}", get(show).put(update).delete(destroy))
        .route("/api/articles/{id}/stock", post(adjust_stock))
}

/// List articles, optionally by category or matching a search term.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn index(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ArticleFilter>,
) -> Result<Json<Vec<Article>>, AppError> {
    Ok(Json(ArticleRepository::new(state.pool()).list(&filter).await?))
}

/// Articles whose stock is at or below `?threshold=` (default 5).
///
/// # Errors
///
/// Returns 400 for a negative threshold.
pub async fn low_stock(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<LowStockQuery>,
) -> Result<Json<Vec<Article>>, AppError> {
    let threshold = query.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    if threshold < 0 {
        return Err(AppError::BadRequest(
            "threshold cannot be negative".to_owned(),
        ));
    }
    Ok(Json(
        ArticleRepository::new(state.pool())
            .low_stock(threshold)
            .await?,
    ))
}

/// Get one article with its category.
///
/// # Errors
///
/// Returns 404 if the article does not exist.
pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<ArticleId>,
) -> Result<Json<ArticleDetail>, AppError> {
    ArticleRepository::new(state.pool())
        .get_detail(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Article", id))
}

/// Create an article.
///
/// # Errors
///
/// Returns 400 if the category does not exist, 409 if the code is taken.
pub async fn create(
    State(state): State<AppState>,
    Validated(input): Validated<NewArticle>,
) -> Result<(StatusCode, Json<Article>), AppError> {
    let article = ArticleRepository::new(state.pool()).create(&input).await?;
    tracing::info!(article_id = %article.id, code = %article.code, "Article created");
    Ok((StatusCode::CREATED, Json(article)))
}

/// Update the supplied fields of an article.
///
/// # Errors
///
/// Returns 404 if the article does not exist, 400 for an unknown category,
/// 409 if the new code is taken.
pub async fn update(
    State(state): State<AppState>,
    PathParam(id): PathParam<ArticleId>,
    Validated(input): Validated<ArticleUpdate>,
) -> Result<Json<Article>, AppError> {
    let article = ArticleRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(or_not_found("Article", id))?;
    Ok(Json(article))
}

/// Delete an article.
///
/// # Errors
///
/// Returns 404 if the article does not exist, 409 while order lines use it.
pub async fn destroy(
    State(state): State<AppState>,
    PathParam(id): PathParam<ArticleId>,
) -> Result<Json<Deleted>, AppError> {
    ArticleRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found("Article", id))?;
    tracing::info!(article_id = %id, "Article deleted");
    Ok(Json(Deleted::new("Article")))
}

/// Correct an article's stock by a signed delta.
///
/// # Errors
///
/// Returns 404 if the article does not exist, 409 if stock would go negative.
pub async fn adjust_stock(
    State(state): State<AppState>,
    PathParam(id): PathParam<ArticleId>,
    Validated(input): Validated<StockAdjustment>,
) -> Result<Json<Article>, AppError> {
    let article = ArticleRepository::new(state.pool())
        .adjust_stock(id, input.delta)
        .await
        .map_err(or_not_found("Article", id))?;
    tracing::info!(article_id = %id, delta = input.delta, quantity = article.quantity, "Stock adjusted");
    Ok(Json(article))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::test_support::{json_body, send};
    use super::*;

    #[tokio::test]
    async fn test_negative_price_is_422() {
        let response = send(
            "POST",
            "/api/articles",
            Some(
                r#"{"code":"A1","designation":"Mug","quantity":3,"price":"-1.00","category_id":1}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["fields"][0]["field"], "price");
    }

    #[tokio::test]
    async fn test_price_beyond_column_is_422() {
        let response = send(
            "POST",
            "/api/articles",
            Some(
                r#"{"code":"A1","designation":"Mug","quantity":3,"price":"12345678901.00","category_id":1}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["fields"][0]["code"], "too_large");
    }

    #[tokio::test]
    async fn test_discount_out_of_range_is_400() {
        let response = send(
            "POST",
            "/api/articles",
            Some(
                r#"{"code":"A1","designation":"Mug","quantity":3,"price":"9.90","discount":"120","category_id":1}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_negative_threshold_is_400() {
        let response = send("GET", "/api/articles/low-stock?threshold=-1", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stock_delta_must_be_integer() {
        let response = send("POST", "/api/articles/3/stock", Some(r#"{"delta":"lots"}"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
