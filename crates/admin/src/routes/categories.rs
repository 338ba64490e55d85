//! Category route handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

use comptoir_core::CategoryId;

use super::{Deleted, or_not_found};
use crate::db::CategoryRepository;
use crate::error::AppError;
use crate::extract::{PathParam, Pagination, QueryParams, Validated};
use crate::models::category::{Category, CategoryUpdate, NewCategory};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(index).post(create))
        .route("/api/categories/{id}", get(show).put(update).delete(destroy))
}

/// List categories ordered by code.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn index(
    State(state): State<AppState>,
    QueryParams(paging): QueryParams<Pagination>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = CategoryRepository::new(state.pool())
        .list(paging.into())
        .await?;
    Ok(Json(categories))
}

/// Get one category.
///
/// # Errors
///
/// Returns 404 if the category does not exist.
pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<CategoryId>,
) -> Result<Json<Category>, AppError> {
    CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Category", id))
}

/// Create a category.
///
/// # Errors
///
/// Returns 409 if the code is already taken.
pub async fn create(
    State(state): State<AppState>,
    Validated(input): Validated<NewCategory>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category = CategoryRepository::new(state.pool()).create(&input).await?;
    tracing::info!(category_id = %category.id, code = %category.code, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// Update the supplied fields of a category.
///
/// # Errors
///
/// Returns 404 if the category does not exist, 409 if the new code is taken.
pub async fn update(
    State(state): State<AppState>,
    PathParam(id): PathParam<CategoryId>,
    Validated(input): Validated<CategoryUpdate>,
) -> Result<Json<Category>, AppError> {
    let category = CategoryRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(or_not_found("Category", id))?;
    Ok(Json(category))
}

/// Delete a category.
///
/// # Errors
///
/// Returns 404 if the category does not exist, 409 while articles use it.
pub async fn destroy(
    State(state): State<AppState>,
    PathParam(id): PathParam<CategoryId>,
) -> Result<Json<Deleted>, AppError> {
    CategoryRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found("Category", id))?;
    tracing::info!(category_id = %id, "Category deleted");
    Ok(Json(Deleted::new("Category")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::test_support::{json_body, send};
    use super::*;

    #[tokio::test]
    async fn test_create_blank_code_is_422() {
        let response = send(
            "POST",
            "/api/categories",
            Some(r#"{"code":"  ","description":"Teas"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["fields"][0]["field"], "code");
    }

    #[tokio::test]
    async fn test_create_missing_field_is_400() {
        let response = send("POST", "/api/categories", Some(r#"{"code":"TEA"}"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let response = send("POST", "/api/categories", Some("{not json")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].is_string());
    }
}
