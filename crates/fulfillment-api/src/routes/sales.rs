//! Routes for the Sales bounded context.

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use fulfillment_sales::application::query_handlers::OrderView;
use fulfillment_sales::application::{command_handlers, query_handlers};
use fulfillment_sales::domain::commands;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::json::ApiJson;
use crate::state::SalesState;

/// Request body for POST /pedidos.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Requested items in order.
    pub items: Vec<OrderItemBody>,
}

/// One requested item.
#[derive(Debug, Deserialize)]
pub struct OrderItemBody {
    /// The product to buy.
    pub product_id: Uuid,
    /// Units requested.
    pub quantity: i32,
}

/// POST /pedidos
#[instrument(skip(state, caller, request), fields(item_count = request.items.len()))]
async fn create_order(
    State(state): State<SalesState>,
    Caller(caller): Caller,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = commands::CreateOrder {
        correlation_id: Uuid::new_v4(),
        items: request
            .items
            .iter()
            .map(|item| commands::OrderItemRequest {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect(),
    };

    info!(correlation_id = %command.correlation_id, "handling create_order command");

    let created = command_handlers::handle_create_order(
        &command,
        &caller,
        state.clock.as_ref(),
        state.stock.as_ref(),
        state.orders.as_ref(),
        state.publisher.as_ref(),
    )
    .await
    .map_err(|rejection| ApiError::order(rejection, state.stock_retry_after))?;

    let view = OrderView::from(&created.order);
    let location = format!("/vendas/pedidos/{}", view.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(view)))
}

/// GET /pedidos
#[instrument(skip(state, _caller))]
async fn list_orders(
    State(state): State<SalesState>,
    _caller: Caller,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    Ok(Json(query_handlers::list_orders(state.orders.as_ref()).await?))
}

/// GET /pedidos/{id}
#[instrument(skip(state, _caller))]
async fn get_order(
    State(state): State<SalesState>,
    _caller: Caller,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderView>, ApiError> {
    Ok(Json(
        query_handlers::get_order_by_id(order_id, state.orders.as_ref()).await?,
    ))
}

/// Returns the router for the sales context.
pub fn router() -> Router<SalesState> {
    Router::new()
        .route("/pedidos", get(list_orders).post(create_order))
        .route("/pedidos/{id}", get(get_order))
}
