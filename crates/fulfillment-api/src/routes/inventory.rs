//! Routes for the Inventory bounded context.

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use fulfillment_inventory::application::query_handlers::ProductView;
use fulfillment_inventory::application::{command_handlers, query_handlers};
use fulfillment_inventory::domain::commands;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::json::ApiJson;
use crate::state::InventoryState;

/// Request body for POST /produtos.
#[derive(Debug, Deserialize)]
pub struct RegisterProductRequest {
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price in cents.
    pub price_cents: i64,
    /// Initial units on hand.
    pub quantity_on_hand: i32,
}

/// Request body for PUT /produtos/{id}/quantidade.
#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    /// New absolute quantity.
    pub quantity: i32,
}

/// Response body for a quantity change.
#[derive(Debug, Serialize)]
pub struct QuantityChangedResponse {
    /// The adjusted product.
    pub product_id: Uuid,
    /// Quantity before the change.
    pub previous: i32,
    /// Quantity after the change.
    pub current: i32,
}

/// POST /produtos
#[instrument(skip(state, _caller, request))]
async fn register_product(
    State(state): State<InventoryState>,
    _caller: Caller,
    ApiJson(request): ApiJson<RegisterProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = commands::RegisterProduct {
        correlation_id: Uuid::new_v4(),
        name: request.name,
        description: request.description,
        price_cents: request.price_cents,
        quantity_on_hand: request.quantity_on_hand,
    };

    info!(correlation_id = %command.correlation_id, "handling register_product command");

    let product = command_handlers::handle_register_product(
        &command,
        state.clock.as_ref(),
        state.products.as_ref(),
    )
    .await?;

    let location = format!("/estoque/produtos/{}", product.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(ProductView::from(&product)),
    ))
}

/// GET /produtos
#[instrument(skip(state, _caller))]
async fn list_products(
    State(state): State<InventoryState>,
    _caller: Caller,
) -> Result<Json<Vec<ProductView>>, ApiError> {
    Ok(Json(
        query_handlers::list_products(state.products.as_ref()).await?,
    ))
}

/// GET /produtos/{id}
#[instrument(skip(state, _caller))]
async fn get_product(
    State(state): State<InventoryState>,
    _caller: Caller,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ProductView>, ApiError> {
    Ok(Json(
        query_handlers::get_product_by_id(product_id, state.products.as_ref()).await?,
    ))
}

/// PUT /produtos/{id}/quantidade
#[instrument(skip(state, _caller, request))]
async fn set_quantity(
    State(state): State<InventoryState>,
    _caller: Caller,
    Path(product_id): Path<Uuid>,
    ApiJson(request): ApiJson<SetQuantityRequest>,
) -> Result<Json<QuantityChangedResponse>, ApiError> {
    let command = commands::SetQuantity {
        correlation_id: Uuid::new_v4(),
        product_id,
        quantity: request.quantity,
    };

    info!(correlation_id = %command.correlation_id, "handling set_quantity command");

    let changed = command_handlers::handle_set_quantity(&command, state.products.as_ref()).await?;

    Ok(Json(QuantityChangedResponse {
        product_id: changed.product_id,
        previous: changed.previous,
        current: changed.current,
    }))
}

/// Returns the router for the inventory context.
pub fn router() -> Router<InventoryState> {
    Router::new()
        .route("/produtos", get(list_products).post(register_product))
        .route("/produtos/{id}", get(get_product))
        .route("/produtos/{id}/quantidade", put(set_quantity))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use fulfillment_core::error::DomainError;
    use fulfillment_inventory::domain::product::Product;
    use fulfillment_inventory::domain::repository::ProductRepository;
    use fulfillment_test_support::FixedClock;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    #[derive(Default)]
    struct InMemoryProducts(Mutex<HashMap<Uuid, Product>>);

    #[async_trait]
    impl ProductRepository for InMemoryProducts {
        async fn find_by_id(&self, product_id: Uuid) -> Result<Option<Product>, DomainError> {
            Ok(self.0.lock().unwrap().get(&product_id).cloned())
        }

        async fn list(&self) -> Result<Vec<Product>, DomainError> {
            Ok(self.0.lock().unwrap().values().cloned().collect())
        }

        async fn insert(&self, product: &Product) -> Result<(), DomainError> {
            self.0.lock().unwrap().insert(product.id, product.clone());
            Ok(())
        }

        async fn update_quantities(
            &self,
            product_ids: &[Uuid],
            apply: &mut (dyn for<'p> FnMut(&'p mut [Product]) + Send),
        ) -> Result<(), DomainError> {
            let mut map = self.0.lock().unwrap();
            let mut loaded: Vec<Product> = product_ids
                .iter()
                .filter_map(|id| map.get(id).cloned())
                .collect();
            apply(&mut loaded);
            for p in loaded {
                map.insert(p.id, p);
            }
            Ok(())
        }
    }

    fn test_app() -> (Router, Arc<InMemoryProducts>) {
        let products = Arc::new(InMemoryProducts::default());
        let state = InventoryState::new(
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())),
            products.clone(),
        );
        (router().with_state(state), products)
    }

    fn request(method: &str, uri: &str, body: Option<&Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", "Bearer t")
            .header("content-type", "application/json");
        match body {
            Some(body) => builder.body(Body::from(serde_json::to_vec(body).unwrap())),
            None => builder.body(Body::empty()),
        }
        .unwrap()
    }

    async fn json_of(response: axum::response::Response) -> Value {
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }

    #[tokio::test]
    async fn test_register_product_returns_201_and_is_queryable() {
        // Arrange
        let (app, products) = test_app();
        let body = json!({ "name": "Widget", "price_cents": 5000, "quantity_on_hand": 10 });

        // Act
        let response = app
            .clone()
            .oneshot(request("POST", "/produtos", Some(&body)))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = json_of(response).await;
        let id: Uuid = json["id"].as_str().unwrap().parse().unwrap();
        assert_eq!(products.0.lock().unwrap()[&id].quantity_on_hand(), 10);

        let response = app
            .oneshot(request("GET", &format!("/produtos/{id}"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_of(response).await;
        assert_eq!(json["name"], "Widget");
        assert_eq!(json["price_cents"], 5000);
        assert_eq!(json["quantity_on_hand"], 10);
    }

    #[tokio::test]
    async fn test_register_product_with_blank_name_returns_400() {
        let (app, _) = test_app();
        let body = json!({ "name": "  ", "price_cents": 1, "quantity_on_hand": 1 });

        let response = app
            .oneshot(request("POST", "/produtos", Some(&body)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_product_with_zero_price_or_long_name_returns_400() {
        let (app, products) = test_app();
        let free = json!({ "name": "Freebie", "price_cents": 0, "quantity_on_hand": 1 });
        let long = json!({ "name": "x".repeat(300), "price_cents": 100, "quantity_on_hand": 1 });

        let free_response = app
            .clone()
            .oneshot(request("POST", "/produtos", Some(&free)))
            .await
            .unwrap();
        let long_response = app
            .oneshot(request("POST", "/produtos", Some(&long)))
            .await
            .unwrap();

        assert_eq!(free_response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_of(free_response).await["error"], "validation_error");
        assert_eq!(long_response.status(), StatusCode::BAD_REQUEST);
        assert!(products.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_quantity_with_non_numeric_body_returns_structured_400() {
        let (app, products) = test_app();
        let product = Product::restore(Uuid::new_v4(), "Widget".into(), None, 100, 3, Utc::now());
        products.insert(&product).await.unwrap();

        let response = app
            .oneshot(request(
                "PUT",
                &format!("/produtos/{}/quantidade", product.id),
                Some(&json!({ "quantity": "many" })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_of(response).await["error"], "validation_error");
        assert_eq!(products.0.lock().unwrap()[&product.id].quantity_on_hand(), 3);
    }

    #[tokio::test]
    async fn test_get_unknown_product_returns_404() {
        let (app, _) = test_app();

        let response = app
            .oneshot(request("GET", &format!("/produtos/{}", Uuid::new_v4()), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_product_without_bearer_returns_401() {
        let (app, _) = test_app();
        let request = Request::builder()
            .uri(format!("/produtos/{}", Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_set_quantity_returns_previous_and_current() {
        let (app, products) = test_app();
        let product = Product::restore(Uuid::new_v4(), "Widget".into(), None, 100, 3, Utc::now());
        products.insert(&product).await.unwrap();

        let response = app
            .oneshot(request(
                "PUT",
                &format!("/produtos/{}/quantidade", product.id),
                Some(&json!({ "quantity": 7 })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_of(response).await;
        assert_eq!(json["previous"], 3);
        assert_eq!(json["current"], 7);
    }

    #[tokio::test]
    async fn test_set_negative_quantity_returns_400() {
        let (app, products) = test_app();
        let product = Product::restore(Uuid::new_v4(), "Widget".into(), None, 100, 3, Utc::now());
        products.insert(&product).await.unwrap();

        let response = app
            .oneshot(request(
                "PUT",
                &format!("/produtos/{}/quantidade", product.id),
                Some(&json!({ "quantity": -1 })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
