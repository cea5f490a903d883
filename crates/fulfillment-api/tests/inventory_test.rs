//! Integration tests for the Inventory service.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
async fn test_register_and_query_product(pool: PgPool) {
    // POST /estoque/produtos
    let (status, json) = common::post_json(
        common::build_inventory_app(pool.clone()),
        "/estoque/produtos",
        &json!({ "name": "Widget", "description": "Blue", "price_cents": 5000, "quantity_on_hand": 10 }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let id = json["id"].as_str().unwrap().to_owned();

    // GET /estoque/produtos/{id}
    let (status, json) = common::get_json(
        common::build_inventory_app(pool.clone()),
        &format!("/estoque/produtos/{id}"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Widget");
    assert_eq!(json["description"], "Blue");
    assert_eq!(json["price_cents"], 5000);
    assert_eq!(json["quantity_on_hand"], 10);

    // GET /estoque/produtos
    let (status, json) =
        common::get_json(common::build_inventory_app(pool), "/estoque/produtos").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_set_quantity_persists(pool: PgPool) {
    let (_, json) = common::post_json(
        common::build_inventory_app(pool.clone()),
        "/estoque/produtos",
        &json!({ "name": "Widget", "price_cents": 100, "quantity_on_hand": 1 }),
    )
    .await;
    let id = json["id"].as_str().unwrap().to_owned();

    let (status, json) = common::send_json(
        common::build_inventory_app(pool.clone()),
        "PUT",
        &format!("/estoque/produtos/{id}/quantidade"),
        &json!({ "quantity": 25 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["previous"], 1);
    assert_eq!(json["current"], 25);

    let (_, json) = common::get_json(
        common::build_inventory_app(pool),
        &format!("/estoque/produtos/{id}"),
    )
    .await;
    assert_eq!(json["quantity_on_hand"], 25);
}
