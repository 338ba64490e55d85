//! Expedition (shipping method) route handlers.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use comptoir_core::ExpeditionId;

use super::{Deleted, or_not_found};
use crate::db::ExpeditionRepository;
use crate::error::AppError;
use crate::extract::{PathParam, Pagination, QueryParams, Validated};
use crate::models::expedition::{Expedition, ExpeditionUpdate, NewExpedition};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/expeditions", get(index).post(create))
        .route("/api/expeditions/{id}", get(show).put(update).delete(destroy))
}

pub async fn index(
    State(state): State<AppState>,
    QueryParams(paging): QueryParams<Pagination>,
) -> Result<Json<Vec<Expedition>>, AppError> {
    Ok(Json(
        ExpeditionRepository::new(state.pool())
            .list(paging.into())
            .await?,
    ))
}

pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<ExpeditionId>,
) -> Result<Json<Expedition>, AppError> {
    ExpeditionRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Expedition", id))
}

pub async fn create(
    State(state): State<AppState>,
    Validated(input): Validated<NewExpedition>,
) -> Result<(StatusCode, Json<Expedition>), AppError> {
    let expedition = ExpeditionRepository::new(state.pool()).create(&input).await?;
    tracing::info!(expedition_id = %expedition.id, "Expedition created");
    Ok((StatusCode::CREATED, Json(expedition)))
}

/// Update an expedition. Totals of existing orders are left as they were.
pub async fn update(
    State(state): State<AppState>,
    PathParam(id): PathParam<ExpeditionId>,
    Validated(input): Validated<ExpeditionUpdate>,
) -> Result<Json<Expedition>, AppError> {
    let expedition = ExpeditionRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(or_not_found("Expedition", id))?;
    Ok(Json(expedition))
}

pub async fn destroy(
    State(state): State<AppState>,
    PathParam(id): PathParam<ExpeditionId>,
) -> Result<Json<Deleted>, AppError> {
    ExpeditionRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found("Expedition", id))?;
    tracing::info!(expedition_id = %id, "Expedition deleted");
    Ok(Json(Deleted::new("Expedition")))
}
