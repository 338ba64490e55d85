//! Supplier route handlers.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use comptoir_core::SupplierId;

use super::{Deleted, or_not_found};
use crate::db::SupplierRepository;
use crate::error::AppError;
use crate::extract::{PathParam, Pagination, QueryParams, Validated};
use crate::models::supplier::{NewSupplier, Supplier, SupplierUpdate};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/suppliers", get(index).post(create))
        .route("/api/suppliers/{id}", get(show).put(update).delete(destroy))
}

pub async fn index(
    State(state): State<AppState>,
    QueryParams(paging): QueryParams<Pagination>,
) -> Result<Json<Vec<Supplier>>, AppError> {
    Ok(Json(
        SupplierRepository::new(state.pool())
            .list(paging.into())
            .await?,
    ))
}

pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<SupplierId>,
) -> Result<Json<Supplier>, AppError> {
    SupplierRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Supplier", id))
}

pub async fn create(
    State(state): State<AppState>,
    Validated(input): Validated<NewSupplier>,
) -> Result<(StatusCode, Json<Supplier>), AppError> {
    let supplier = SupplierRepository::new(state.pool()).create(&input).await?;
    tracing::info!(supplier_id = %supplier.id, "Supplier created");
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update(
    State(state): State<AppState>,
    PathParam(id): PathParam<SupplierId>,
    Validated(input): Validated<SupplierUpdate>,
) -> Result<Json<Supplier>, AppError> {
    let supplier = SupplierRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(or_not_found("Supplier", id))?;
    Ok(Json(supplier))
}

/// Delete a supplier; refused with 409 while it has orders.
pub async fn destroy(
    State(state): State<AppState>,
    PathParam(id): PathParam<SupplierId>,
) -> Result<Json<Deleted>, AppError> {
    SupplierRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found("Supplier", id))?;
    tracing::info!(supplier_id = %id, "Supplier deleted");
    Ok(Json(Deleted::new("Supplier")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::test_support::{json_body, send};
    use super::*;

    #[tokio::test]
    async fn test_blank_city_is_422() {
        let response = send(
            "POST",
            "/api/suppliers",
            Some(
                r#"{"first_name":"Lin","last_name":"Wu","email":"lin@example.com","phone":"0600",
                    "address1":"1 Quay St","city":" ","country":"FR"}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["fields"][0]["field"], "city");
    }
}
