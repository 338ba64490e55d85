//! HTTP route handlers for the back-office API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                 - Liveness check
//! GET    /health/ready                           - Readiness check (database)
//!
//! # Catalog
//! GET    /api/categories                         - List categories
//! POST   /api/categories                         - Create category
//! GET    /api/categories/{id}                    - Category detail
//! PUT    /api/categories/{id}                    - Update category
//! DELETE /api/categories/{id}                    - Delete category
//! GET    /api/articles                           - List articles (?category_id, ?q)
//! POST   /api/articles                           - Create article
//! GET    /api/articles/low-stock                 - Articles at or below a threshold
//! GET    /api/articles/{id}                      - Article detail with category
//! PUT    /api/articles/{id}                      - Update article
//! DELETE /api/articles/{id}                      - Delete article
//! POST   /api/articles/{id}/stock                - Manual stock adjustment
//!
//! # Parties and shipping
//! GET|POST            /api/clients               - List / create clients
//! GET|PUT|DELETE      /api/clients/{id}
//! GET|POST            /api/suppliers             - List / create suppliers
//! GET|PUT|DELETE      /api/suppliers/{id}
//! GET|POST            /api/expeditions           - List / create expeditions
//! GET|PUT|DELETE      /api/expeditions/{id}
//!
//! # Orders
//! GET|POST            /api/client-orders         - List / create client orders
//! GET|PATCH|DELETE    /api/client-orders/{id}
//! GET|POST            /api/client-orders/{id}/invoice - Fetch / issue the invoice
//! GET|POST            /api/supplier-orders       - List / create supplier orders
//! GET|PATCH|DELETE    /api/supplier-orders/{id}
//!
//! # Invoices
//! GET    /api/client-invoices/{id}               - Invoice detail
//! ```

pub mod articles;
pub mod categories;
pub mod client_invoices;
pub mod client_orders;
pub mod clients;
pub mod expeditions;
pub mod health;
pub mod supplier_orders;
pub mod suppliers;

use std::fmt::Display;

use axum::Router;
use serde::Serialize;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::state::AppState;

/// Build the complete router, without middleware or state.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(categories::router())
        .merge(articles::router())
        .merge(clients::router())
        .merge(suppliers::router())
        .merge(expeditions::router())
        .merge(client_orders::router())
        .merge(supplier_orders::router())
        .merge(client_invoices::router())
}

/// Body returned by successful deletes.
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub message: String,
}

impl Deleted {
    fn new(kind: &str) -> Self {
        Self {
            message: format!("{kind} deleted successfully"),
        }
    }
}

/// Turn a repository `NotFound` into a 404 naming the record.
fn or_not_found<I: Display>(kind: &'static str, id: I) -> impl FnOnce(RepositoryError) -> AppError {
    move |err| match err {
        RepositoryError::NotFound => AppError::not_found(kind, id),
        other => AppError::Database(other),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, Response, header};
    use http_body_util::BodyExt;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::config::AdminConfig;
    use crate::state::AppState;

    /// Router over a pool that never connects. Requests that reach the
    /// database fail, so tests only cover what is rejected before that.
    #[allow(clippy::unwrap_used)]
    pub fn app() -> Router {
        let config = AdminConfig::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://comptoir@127.0.0.1:1/comptoir".to_owned()),
            _ => None,
        })
        .unwrap();
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy("postgres://comptoir@127.0.0.1:1/comptoir")
            .unwrap();

        super::routes().with_state(AppState::new(config, pool))
    }

    #[allow(clippy::unwrap_used)]
    pub async fn send(method: &str, uri: &str, body: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_owned())
            }
            None => Body::empty(),
        };
        app().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    #[allow(clippy::unwrap_used)]
    pub async fn json_body(response: Response<Body>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use super::test_support::{json_body, send};
    use super::*;

    #[test]
    fn test_deleted_message() {
        assert_eq!(
            Deleted::new("Category").message,
            "Category deleted successfully"
        );
    }

    #[test]
    fn test_or_not_found_names_record() {
        let err = or_not_found("Article", 12)(RepositoryError::NotFound);
        assert_eq!(err.to_string(), "Not found: Article 12 not found");

        let err = or_not_found("Article", 12)(RepositoryError::Conflict("busy".to_owned()));
        assert!(matches!(err, AppError::Database(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = send("GET", "/api/widgets", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_path_id_is_json_400() {
        let response = send("GET", "/api/clients/abc", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].is_string());
    }
}
