//! Client route handlers.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use comptoir_core::ClientId;

use super::{Deleted, or_not_found};
use crate::db::ClientRepository;
use crate::error::AppError;
use crate::extract::{PathParam, Pagination, QueryParams, Validated};
use crate::models::client::{Client, ClientUpdate, NewClient};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/clients", get(index).post(create))
        .route("/api/clients/{id}", get(show).put(update).delete(destroy))
}

/// List clients.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn index(
    State(state): State<AppState>,
    QueryParams(paging): QueryParams<Pagination>,
) -> Result<Json<Vec<Client>>, AppError> {
    Ok(Json(
        ClientRepository::new(state.pool())
            .list(paging.into())
            .await?,
    ))
}

/// Get one client.
///
/// # Errors
///
/// Returns 404 if the client does not exist.
pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<ClientId>,
) -> Result<Json<Client>, AppError> {
    ClientRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Client", id))
}

/// Create a client.
///
/// # Errors
///
/// Returns 409 if the email is already registered.
pub async fn create(
    State(state): State<AppState>,
    Validated(input): Validated<NewClient>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    let client = ClientRepository::new(state.pool()).create(&input).await?;
    tracing::info!(client_id = %client.id, "Client created");
    Ok((StatusCode::CREATED, Json(client)))
}

/// Update the supplied fields of a client.
///
/// # Errors
///
/// Returns 404 if the client does not exist, 409 if the new email is taken.
pub async fn update(
    State(state): State<AppState>,
    PathParam(id): PathParam<ClientId>,
    Validated(input): Validated<ClientUpdate>,
) -> Result<Json<Client>, AppError> {
    let client = ClientRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(or_not_found("Client", id))?;
    Ok(Json(client))
}

/// Delete a client without orders.
///
/// # Errors
///
/// Returns 404 if the client does not exist, 409 if it has orders.
pub async fn destroy(
    State(state): State<AppState>,
    PathParam(id): PathParam<ClientId>,
) -> Result<Json<Deleted>, AppError> {
    ClientRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found("Client", id))?;
    tracing::info!(client_id = %id, "Client deleted");
    Ok(Json(Deleted::new("Client")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::test_support::send;
    use super::*;

    #[tokio::test]
    async fn test_invalid_email_is_400() {
        let response = send(
            "POST",
            "/api/clients",
            Some(r#"{"first_name":"Ada","last_name":"Byron","email":"not-an-email","phone":"0600"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_url_is_422() {
        let response = send(
            "POST",
            "/api/clients",
            Some(
                r#"{"first_name":"Ada","last_name":"Byron","email":"ada@example.com","phone":"0600","url":"nope"}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
