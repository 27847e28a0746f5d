//! Thin demo HTTP surface over the matching engine. Grounded in the
//! teacher's `api.rs`/`state.rs`; deliberately minimal since spec.md names
//! network/transport as an external collaborator, not part of the core's
//! redesign.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn};

use crate::engine::{BookSnapshot, Engine, OrderModify};
use crate::order::Order;
use crate::trade::Trade;
use crate::types::{OrderId, OrderType, Price, Quantity, Side};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

type ApiErr = (StatusCode, Json<serde_json::Value>);

fn err(status: StatusCode, msg: &str) -> ApiErr {
    (status, Json(json!({ "error": msg })))
}

/// Request payload for `POST /orders`. `price` is ignored for `Market`.
#[derive(Deserialize)]
pub struct NewOrder {
    pub side: Side,
    pub order_type: OrderType,
    pub price: Option<Price>,
    pub quantity: Quantity,
    pub order_id: OrderId,
}

#[derive(serde::Serialize)]
pub struct OrderAck {
    pub order_id: OrderId,
    pub trades: Vec<Trade>,
}

/// `POST /orders` — admits a new order, returning any resulting trades.
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<NewOrder>,
) -> Result<Json<OrderAck>, ApiErr> {
    if payload.quantity == 0 {
        warn!(order_id = payload.order_id, "order rejected: quantity must be > 0");
        return Err(err(StatusCode::BAD_REQUEST, "quantity must be > 0"));
    }

    let order = if payload.order_type == OrderType::Market {
        Order::market(payload.order_id, payload.side, payload.quantity)
    } else {
        let Some(price) = payload.price else {
            return Err(err(StatusCode::BAD_REQUEST, "price required for non-market orders"));
        };
        Order::new(payload.order_type, payload.order_id, payload.side, price, payload.quantity)
    };

    let order_id = order.id();
    let trades = state.engine.add_order(order);
    info!(order_id, trades = trades.len(), "order accepted");
    Ok(Json(OrderAck { order_id, trades }))
}

/// `DELETE /orders/:id` — idempotent cancel.
pub async fn cancel_order(State(state): State<AppState>, Path(id): Path<OrderId>) -> impl IntoResponse {
    state.engine.cancel_order(id);
    (StatusCode::OK, Json(json!({ "status": "cancelled" })))
}

#[derive(Deserialize)]
pub struct ModifyRequest {
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
}

/// `PATCH /orders/:id` — cancel and re-admit at the new side/price/quantity.
pub async fn modify_order(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(payload): Json<ModifyRequest>,
) -> Json<OrderAck> {
    let trades = state.engine.modify_order(OrderModify {
        order_id: id,
        side: payload.side,
        price: payload.price,
        quantity: payload.quantity,
    });
    Json(OrderAck { order_id: id, trades })
}

/// `GET /book` — current per-price aggregates, bids descending, asks ascending.
pub async fn get_book(State(state): State<AppState>) -> Json<BookSnapshot> {
    Json(state.engine.snapshot())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/{id}", delete(cancel_order).patch(modify_order))
        .route("/book", get(get_book))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false).level(tracing::Level::TRACE))
                .on_response(DefaultOnResponse::new().level(tracing::Level::TRACE)),
        )
        .with_state(state)
}
