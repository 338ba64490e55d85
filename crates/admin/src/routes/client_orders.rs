//! Client order route handlers and the invoice issued for an order.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use comptoir_core::{ClientId, ClientOrderId};

use super::{Deleted, or_not_found};
use crate::db::{ClientInvoiceRepository, ClientOrderRepository, ClientRepository};
use crate::error::AppError;
use crate::extract::{PathParam, QueryParams, Validated};
use crate::models::client_order::{
    ClientOrder, ClientOrderCreated, ClientOrderFilter, ClientOrderPatch, NewClientOrder,
};
use crate::models::invoice::ClientInvoice;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/client-orders", get(index).post(create))
        .route(
            "/api/client-orders/{id}",
            get(show).patch(update).delete(destroy),
        )
        .route(
            "/api/client-orders/{id}/invoice",
            get(show_invoice).post(create_invoice),
        )
}

async fn ensure_client(state: &AppState, id: ClientId) -> Result<(), AppError> {
    ClientRepository::new(state.pool())
        .get(id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::not_found("Client", id))
}

/// List client orders, newest first, optionally by client or status.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn index(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ClientOrderFilter>,
) -> Result<Json<Vec<ClientOrder>>, AppError> {
    Ok(Json(
        ClientOrderRepository::new(state.pool())
            .list(&filter)
            .await?,
    ))
}

/// Get one client order with its client, expedition and lines.
///
/// # Errors
///
/// Returns 404 if the order does not exist.
pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<ClientOrderId>,
) -> Result<Json<ClientOrder>, AppError> {
    ClientOrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Client order", id))
}

/// Create a client order and reserve stock for its lines.
///
/// # Errors
///
/// Returns 404 if the client does not exist, 400 for an unknown article or
/// expedition, 409 for a duplicate code or insufficient stock.
pub async fn create(
    State(state): State<AppState>,
    Validated(input): Validated<NewClientOrder>,
) -> Result<(StatusCode, Json<ClientOrderCreated>), AppError> {
    ensure_client(&state, input.client_id).await?;

    let order = ClientOrderRepository::new(state.pool())
        .create(&input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ClientOrderCreated {
            message: "Order created successfully",
            order,
        }),
    ))
}

/// Apply a partial update to a client order.
///
/// # Errors
///
/// Returns 404 if the order or a new client does not exist, 409 for a
/// forbidden status change or insufficient stock.
pub async fn update(
    State(state): State<AppState>,
    PathParam(id): PathParam<ClientOrderId>,
    Validated(patch): Validated<ClientOrderPatch>,
) -> Result<Json<ClientOrder>, AppError> {
    if let Some(client_id) = patch.client_id {
        ensure_client(&state, client_id).await?;
    }

    let order = ClientOrderRepository::new(state.pool())
        .update(id, &patch)
        .await
        .map_err(or_not_found("Client order", id))?;
    Ok(Json(order))
}

/// Delete a client order, releasing the stock it holds.
///
/// # Errors
///
/// Returns 404 if the order does not exist, 409 once it has been invoiced.
pub async fn destroy(
    State(state): State<AppState>,
    PathParam(id): PathParam<ClientOrderId>,
) -> Result<Json<Deleted>, AppError> {
    ClientOrderRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found("Client order", id))?;
    Ok(Json(Deleted::new("Order")))
}

/// Get the invoice issued for an order.
///
/// # Errors
///
/// Returns 404 if the order has no invoice.
pub async fn show_invoice(
    State(state): State<AppState>,
    PathParam(id): PathParam<ClientOrderId>,
) -> Result<Json<ClientInvoice>, AppError> {
    ClientInvoiceRepository::new(state.pool())
        .get_by_order(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no invoice for client order {id}")))
}

/// Issue the invoice for an order from its current lines and total.
///
/// # Errors
///
/// Returns 404 if the order does not exist, 409 if it is cancelled or
/// already invoiced.
pub async fn create_invoice(
    State(state): State<AppState>,
    PathParam(id): PathParam<ClientOrderId>,
) -> Result<(StatusCode, Json<ClientInvoice>), AppError> {
    let invoice = ClientInvoiceRepository::new(state.pool())
        .create_for_order(id)
        .await
        .map_err(or_not_found("Client order", id))?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::test_support::{json_body, send};
    use super::*;

    #[tokio::test]
    async fn test_expedition_string_is_400() {
        let response = send(
            "POST",
            "/api/client-orders",
            Some(
                r#"{"code":"CMD-1","order_date":"2024-03-01T10:00:00Z","client_id":1,
                    "expedition":"64b7f0c2e4","payment_method":"card",
                    "lines":[{"article_id":1,"quantity":1}]}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_lines_is_422() {
        let response = send(
            "POST",
            "/api/client-orders",
            Some(
                r#"{"code":"CMD-1","order_date":"2024-03-01T10:00:00Z","client_id":1,
                    "expedition":2,"payment_method":"card","lines":[]}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["fields"][0]["field"], "lines");
    }

    #[tokio::test]
    async fn test_unknown_status_is_400() {
        let response = send(
            "PATCH",
            "/api/client-orders/4",
            Some(r#"{"status":"lost"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bad_status_filter_is_400() {
        let response = send("GET", "/api/client-orders?status=lost", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
