//! Integration tests for supplier orders and stock replenishment.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The back-office server running (cargo run -p comptoir-admin)

use comptoir_integration_tests::{TestContext, id_of, json_body, unique};
use reqwest::StatusCode;
use serde_json::{Value, json};

fn restock(supplier: &Value, expedition: &Value, article: &Value, quantity: i32) -> Value {
    json!({
        "code": unique("PO"),
        "order_date": "2024-03-01T10:00:00Z",
        "supplier_id": id_of(supplier),
        "expedition": id_of(expedition),
        "payment_method": "transfer",
        "note": "Spring restock",
        "lines": [{ "article_id": id_of(article), "quantity": quantity, "unit_cost": "1.20" }],
    })
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_create_replenishes_stock() {
    let ctx = TestContext::new();
    let category = ctx.create_category().await;
    let article = ctx.create_article(id_of(&category), 2, "3.00").await;
    let supplier = ctx.create_supplier().await;
    let expedition = ctx.create_expedition("80.00").await;

    let created = ctx
        .create(
            "/api/supplier-orders",
            &restock(&supplier, &expedition, &article, 48),
        )
        .await;
    let order = &created["order"];
    assert_eq!(order["total"], "137.60");
    assert_eq!(order["lines"][0]["amount"], "57.60");
    assert_eq!(order["supplier"]["id"], supplier["id"]);
    assert_eq!(ctx.stock_of(id_of(&article)).await, 50);

    let list = json_body(
        ctx.get(&format!(
            "/api/supplier-orders?supplier_id={}",
            id_of(&supplier)
        ))
        .await,
    )
    .await;
    assert_eq!(list.as_array().map_or(0, Vec::len), 1);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_unknown_supplier_is_404() {
    let ctx = TestContext::new();
    let category = ctx.create_category().await;
    let article = ctx.create_article(id_of(&category), 0, "3.00").await;
    let expedition = ctx.create_expedition("10.00").await;
    let mut body = restock(&json!({ "id": 1 }), &expedition, &article, 1);
    body["supplier_id"] = json!(2_000_000_000);

    let resp = ctx.post("/api/supplier-orders", &body).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_delete_after_sale_is_refused() {
    let ctx = TestContext::new();
    let category = ctx.create_category().await;
    let article = ctx.create_article(id_of(&category), 0, "3.00").await;
    let supplier = ctx.create_supplier().await;
    let expedition = ctx.create_expedition("10.00").await;

    let created = ctx
        .create(
            "/api/supplier-orders",
            &restock(&supplier, &expedition, &article, 5),
        )
        .await;
    let path = format!("/api/supplier-orders/{}", id_of(&created["order"]));

    // Sell three of the five delivered units
    let resp = ctx
        .post(
            &format!("/api/articles/{}/stock", id_of(&article)),
            &json!({ "delta": -3 }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx.delete(&path).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(ctx.stock_of(id_of(&article)).await, 2);

    // Lowering the delivered quantity to what is left works
    let resp = ctx
        .patch(
            &path,
            &json!({ "lines": [{ "article_id": id_of(&article), "quantity": 3, "unit_cost": "1.20" }] }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["total"], "13.60");
    assert_eq!(ctx.stock_of(id_of(&article)).await, 0);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_delete_reverts_replenishment() {
    let ctx = TestContext::new();
    let category = ctx.create_category().await;
    let article = ctx.create_article(id_of(&category), 1, "3.00").await;
    let supplier = ctx.create_supplier().await;
    let expedition = ctx.create_expedition("10.00").await;

    let created = ctx
        .create(
            "/api/supplier-orders",
            &restock(&supplier, &expedition, &article, 4),
        )
        .await;
    assert_eq!(ctx.stock_of(id_of(&article)).await, 5);

    let resp = ctx
        .delete(&format!("/api/supplier-orders/{}", id_of(&created["order"])))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(ctx.stock_of(id_of(&article)).await, 1);
}
