//! Integration test helpers for the Comptoir back-office API.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate a scratch database and start the server
//! cargo run -p comptoir-cli -- migrate
//! cargo run -p comptoir-admin
//!
//! # Run the ignored HTTP tests against it
//! cargo test -p comptoir-integration-tests -- --ignored
//! ```
//!
//! `COMPTOIR_BASE_URL` overrides the default `http://localhost:5000`.
//! Every helper creates records with unique codes so runs do not collide.

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// HTTP client bound to the server under test.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: std::env::var("COMPTOIR_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_owned()),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn put(&self, path: &str, body: &Value) -> Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PUT request failed")
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Response {
        self.client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PATCH request failed")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("DELETE request failed")
    }

    /// POST and require a 201, returning the body.
    pub async fn create(&self, path: &str, body: &Value) -> Value {
        let resp = self.post(path, body).await;
        let status = resp.status();
        let body = json_body(resp).await;
        assert_eq!(status, StatusCode::CREATED, "POST {path} failed: {body}");
        body
    }

    pub async fn create_category(&self) -> Value {
        self.create(
            "/api/categories",
            &json!({ "code": unique("CAT"), "description": "Test category" }),
        )
        .await
    }

    pub async fn create_article(&self, category_id: i64, quantity: i32, price: &str) -> Value {
        self.create(
            "/api/articles",
            &json!({
                "code": unique("ART"),
                "designation": "Test article",
                "quantity": quantity,
                "price": price,
                "category_id": category_id,
            }),
        )
        .await
    }

    pub async fn create_client(&self) -> Value {
        self.create(
            "/api/clients",
            &json!({
                "first_name": "Test",
                "last_name": "Client",
                "email": format!("{}@example.com", unique("client").to_lowercase()),
                "phone": "0600000000",
            }),
        )
        .await
    }

    pub async fn create_supplier(&self) -> Value {
        self.create(
            "/api/suppliers",
            &json!({
                "first_name": "Test",
                "last_name": "Supplier",
                "email": format!("{}@example.com", unique("supplier").to_lowercase()),
                "phone": "0600000000",
                "address1": "1 Quay Street",
                "city": "Lyon",
                "country": "FR",
            }),
        )
        .await
    }

    pub async fn create_expedition(&self, cost: &str) -> Value {
        self.create(
            "/api/expeditions",
            &json!({ "name": unique("Carrier"), "cost": cost }),
        )
        .await
    }

    /// Current stock of an article.
    pub async fn stock_of(&self, article_id: i64) -> i64 {
        let body = json_body(self.get(&format!("/api/articles/{article_id}")).await).await;
        body["quantity"].as_i64().expect("article has a quantity")
    }
}

/// A code nobody else has used, e.g. `ART-3f2a9c1b`.
#[must_use]
pub fn unique(prefix: &str) -> String {
    let id: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("{prefix}-{id}")
}

pub async fn json_body(resp: Response) -> Value {
    resp.json().await.expect("response body is JSON")
}

/// Numeric ID field of a created record.
#[must_use]
pub fn id_of(record: &Value) -> i64 {
    record["id"].as_i64().expect("record has an id")
}
