//! Client invoice route handlers.
//!
//! Invoices are issued through `POST /api/client-orders/{id}/invoice`; this
//! module only reads them back by their own ID.

use axum::{Json, Router, extract::State, routing::get};

use comptoir_core::ClientInvoiceId;

use crate::db::ClientInvoiceRepository;
use crate::error::AppError;
use crate::extract::PathParam;
use crate::models::invoice::ClientInvoice;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/client-invoices/{id}", get(show))
}

/// Get an invoice with its order, client and line designations.
///
/// # Errors
///
/// Returns 404 if the invoice does not exist.
pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<ClientInvoiceId>,
) -> Result<Json<ClientInvoice>, AppError> {
    ClientInvoiceRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Invoice", id))
}
