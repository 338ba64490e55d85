//! Integration tests for categories, articles, parties and expeditions.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The back-office server running (cargo run -p comptoir-admin)

use comptoir_integration_tests::{TestContext, id_of, json_body, unique};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_health_endpoints() {
    let ctx = TestContext::new();

    let resp = ctx.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap_or_default(), "ok");

    let resp = ctx.get("/health/ready").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_category_crud_and_duplicate_code() {
    let ctx = TestContext::new();
    let category = ctx.create_category().await;
    let id = id_of(&category);

    // Same code again
    let resp = ctx
        .post(
            "/api/categories",
            &json!({ "code": category["code"], "description": "Again" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = json_body(resp).await;
    assert_eq!(body["error"], "a category with this code already exists");

    let resp = ctx
        .put(
            &format!("/api/categories/{id}"),
            &json!({ "description": "Renamed" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["description"], "Renamed");
    assert_eq!(body["code"], category["code"]);

    let resp = ctx.delete(&format!("/api/categories/{id}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["message"], "Category deleted successfully");

    let resp = ctx.get(&format!("/api/categories/{id}")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_category_in_use_cannot_be_deleted() {
    let ctx = TestContext::new();
    let category = ctx.create_category().await;
    ctx.create_article(id_of(&category), 1, "2.00").await;

    let resp = ctx
        .delete(&format!("/api/categories/{}", id_of(&category)))
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_article_detail_and_search() {
    let ctx = TestContext::new();
    let category = ctx.create_category().await;
    let article = ctx.create_article(id_of(&category), 7, "12.50").await;

    let resp = ctx.get(&format!("/api/articles/{}", id_of(&article))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["price"], "12.50");
    assert_eq!(body["sale_price"], "12.50");
    assert_eq!(body["category"]["code"], category["code"]);

    let code = article["code"].as_str().unwrap_or_default().to_lowercase();
    let resp = ctx.get(&format!("/api/articles?q={code}")).await;
    let body = json_body(resp).await;
    let found = body.as_array().map_or(0, Vec::len);
    assert_eq!(found, 1);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_article_unknown_category_is_400() {
    let ctx = TestContext::new();
    let resp = ctx
        .post(
            "/api/articles",
            &json!({
                "code": unique("ART"),
                "designation": "Orphan",
                "quantity": 1,
                "price": "1.00",
                "category_id": 2_000_000_000,
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"], "category does not exist");
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_manual_stock_adjustment() {
    let ctx = TestContext::new();
    let category = ctx.create_category().await;
    let article = ctx.create_article(id_of(&category), 3, "1.00").await;
    let path = format!("/api/articles/{}/stock", id_of(&article));

    let resp = ctx.post(&path, &json!({ "delta": 5 })).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["quantity"], 8);

    let resp = ctx.post(&path, &json!({ "delta": -9 })).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(ctx.stock_of(id_of(&article)).await, 8);

    let resp = ctx.post("/api/articles/2000000000/stock", &json!({ "delta": 1 })).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_low_stock_lists_article() {
    let ctx = TestContext::new();
    let category = ctx.create_category().await;
    let article = ctx.create_article(id_of(&category), 0, "1.00").await;

    let resp = ctx.get("/api/articles/low-stock?threshold=0").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    let listed = body
        .as_array()
        .is_some_and(|rows| rows.iter().any(|a| a["id"] == article["id"]));
    assert!(listed);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_client_duplicate_email_is_409() {
    let ctx = TestContext::new();
    let client = ctx.create_client().await;

    let resp = ctx
        .post(
            "/api/clients",
            &json!({
                "first_name": "Other",
                "last_name": "Person",
                "email": client["email"],
                "phone": "0611111111",
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_expedition_update_and_delete() {
    let ctx = TestContext::new();
    let expedition = ctx.create_expedition("4.95").await;
    let path = format!("/api/expeditions/{}", id_of(&expedition));

    let resp = ctx.put(&path, &json!({ "cost": "5.50" })).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["cost"], "5.50");

    let resp = ctx.delete(&path).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        json_body(resp).await["message"],
        "Expedition deleted successfully"
    );
}
