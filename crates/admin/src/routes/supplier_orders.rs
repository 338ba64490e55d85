//! Supplier order route handlers.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use comptoir_core::{SupplierId, SupplierOrderId};

use super::{Deleted, or_not_found};
use crate::db::{SupplierOrderRepository, SupplierRepository};
use crate::error::AppError;
use crate::extract::{PathParam, QueryParams, Validated};
use crate::models::supplier_order::{
    NewSupplierOrder, SupplierOrder, SupplierOrderCreated, SupplierOrderFilter,
    SupplierOrderPatch,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/supplier-orders", get(index).post(create))
        .route(
            "/api/supplier-orders/{id}",
            get(show).patch(update).delete(destroy),
        )
}

async fn ensure_supplier(state: &AppState, id: SupplierId) -> Result<(), AppError> {
    SupplierRepository::new(state.pool())
        .get(id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::not_found("Supplier", id))
}

pub async fn index(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<SupplierOrderFilter>,
) -> Result<Json<Vec<SupplierOrder>>, AppError> {
    Ok(Json(
        SupplierOrderRepository::new(state.pool())
            .list(&filter)
            .await?,
    ))
}

pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<SupplierOrderId>,
) -> Result<Json<SupplierOrder>, AppError> {
    SupplierOrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Supplier order", id))
}

/// Create a supplier order and replenish stock for its lines.
///
/// # Errors
///
/// Returns 404 if the supplier does not exist, 400 for an unknown article,
/// category or expedition, 409 for a duplicate code.
pub async fn create(
    State(state): State<AppState>,
    Validated(input): Validated<NewSupplierOrder>,
) -> Result<(StatusCode, Json<SupplierOrderCreated>), AppError> {
    ensure_supplier(&state, input.supplier_id).await?;

    let order = SupplierOrderRepository::new(state.pool())
        .create(&input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SupplierOrderCreated {
            message: "Order created successfully",
            order,
        }),
    ))
}

/// Apply a partial update to a supplier order.
///
/// # Errors
///
/// Returns 404 if the order or a new supplier does not exist, 409 for a
/// forbidden status change or when delivered units were already sold.
pub async fn update(
    State(state): State<AppState>,
    PathParam(id): PathParam<SupplierOrderId>,
    Validated(patch): Validated<SupplierOrderPatch>,
) -> Result<Json<SupplierOrder>, AppError> {
    if let Some(supplier_id) = patch.supplier_id {
        ensure_supplier(&state, supplier_id).await?;
    }

    let order = SupplierOrderRepository::new(state.pool())
        .update(id, &patch)
        .await
        .map_err(or_not_found("Supplier order", id))?;
    Ok(Json(order))
}

/// Delete a supplier order, taking its units back out of stock.
///
/// # Errors
///
/// Returns 404 if the order does not exist, 409 when the units were sold.
pub async fn destroy(
    State(state): State<AppState>,
    PathParam(id): PathParam<SupplierOrderId>,
) -> Result<Json<Deleted>, AppError> {
    SupplierOrderRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found("Supplier order", id))?;
    Ok(Json(Deleted::new("Order")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::test_support::{json_body, send};
    use super::*;

    #[tokio::test]
    async fn test_negative_unit_cost_is_422() {
        let response = send(
            "POST",
            "/api/supplier-orders",
            Some(
                r#"{"code":"PO-1","order_date":"2024-03-01T10:00:00Z","supplier_id":1,
                    "expedition":1,"payment_method":"transfer",
                    "lines":[{"article_id":1,"quantity":10,"unit_cost":"-2.00"}]}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["fields"][0]["code"], "unit_cost");
    }

    #[tokio::test]
    async fn test_oversized_unit_cost_is_422() {
        let response = send(
            "POST",
            "/api/supplier-orders",
            Some(
                r#"{"code":"PO-1","order_date":"2024-03-01T10:00:00Z","supplier_id":1,
                    "expedition":1,"payment_method":"transfer",
                    "lines":[{"article_id":1,"quantity":2,"unit_cost":"79228162514264337593543950335"}]}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["fields"][0]["code"], "unit_cost");
    }

    #[tokio::test]
    async fn test_sub_cent_unit_cost_is_422() {
        let response = send(
            "POST",
            "/api/supplier-orders",
            Some(
                r#"{"code":"PO-1","order_date":"2024-03-01T10:00:00Z","supplier_id":1,
                    "expedition":1,"payment_method":"transfer",
                    "lines":[{"article_id":1,"quantity":10,"unit_cost":"1.005"}]}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_inline_expedition_missing_cost_is_400() {
        let response = send(
            "POST",
            "/api/supplier-orders",
            Some(
                r#"{"code":"PO-1","order_date":"2024-03-01T10:00:00Z","supplier_id":1,
                    "expedition":{"name":"Freight"},"payment_method":"transfer",
                    "lines":[{"article_id":1,"quantity":10,"unit_cost":"2.00"}]}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
