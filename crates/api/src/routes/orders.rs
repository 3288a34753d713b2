//! Order creation and lookup endpoints.

use std::fmt::Display;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{BasketId, OrderId};
use domain::{Address, Order};
use fulfillment::{
    NotificationPublisher, OrderOrchestrator, OrderOutcome, OrderStatus, ReservationClient,
    StepOutcome,
};
use order_store::{BasketReader, CatalogReader, OrderStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Reservation client chosen at startup.
pub type SharedReservationClient = Arc<dyn ReservationClient>;

/// Notification publisher chosen at startup.
pub type SharedNotificationPublisher = Arc<dyn NotificationPublisher>;

/// Marker for stores that can back the API.
pub trait AppStore: BasketReader + CatalogReader + OrderStore + 'static {}

impl<T: BasketReader + CatalogReader + OrderStore + 'static> AppStore for T {}

/// Shared application state accessible from all handlers.
pub struct AppState<S: AppStore> {
    pub orchestrator:
        OrderOrchestrator<S, SharedReservationClient, SharedNotificationPublisher>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub basket_id: i64,
    pub shipping_address: AddressRequest,
}

#[derive(Deserialize)]
pub struct AddressRequest {
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct StepResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<E: Display> From<&StepOutcome<E>> for StepResponse {
    fn from(outcome: &StepOutcome<E>) -> Self {
        Self {
            status: outcome.as_str(),
            error: outcome.error().map(ToString::to_string),
        }
    }
}

#[derive(Serialize)]
pub struct OrderCreatedResponse {
    pub order_id: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub reservation: StepResponse,
    pub notification: StepResponse,
}

impl From<&OrderOutcome> for OrderCreatedResponse {
    fn from(outcome: &OrderOutcome) -> Self {
        Self {
            order_id: outcome.order_id.to_string(),
            status: outcome.status(),
            total_cents: outcome.total.cents(),
            reservation: StepResponse::from(&outcome.reservation),
            notification: StepResponse::from(&outcome.notification),
        }
    }
}

#[derive(Serialize)]
pub struct AddressResponse {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub item_id: i64,
    pub name: String,
    pub picture_uri: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub buyer_id: String,
    pub order_date: DateTime<Utc>,
    pub ship_to: AddressResponse,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        let ship_to = order.ship_to();
        Self {
            id: order.id().to_string(),
            buyer_id: order.buyer_id().to_string(),
            order_date: order.order_date(),
            ship_to: AddressResponse {
                street: ship_to.street.clone(),
                city: ship_to.city.clone(),
                state: ship_to.state.clone(),
                country: ship_to.country.clone(),
                zip_code: ship_to.zip_code.clone(),
            },
            items: order
                .items()
                .iter()
                .map(|item| OrderItemResponse {
                    item_id: item.item_id.as_i64(),
                    name: item.name.clone(),
                    picture_uri: item.picture_uri.clone(),
                    unit_price_cents: item.unit_price.cents(),
                    quantity: item.quantity,
                })
                .collect(),
            total_cents: order.total().cents(),
        }
    }
}

// -- Handlers --

/// POST /orders: turn a basket into an order.
///
/// Answers 201 once the order is written, with `status` telling whether the
/// reservation steps went through (`confirmed`) or need follow-up (`pending`).
#[tracing::instrument(skip(state, req), fields(basket_id = req.basket_id))]
pub async fn create<S: AppStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let address = req.shipping_address;
    let ship_to = Address::new(
        address.street,
        address.city,
        address.state,
        address.country,
        address.zip_code,
    )
    .map_err(|e| ApiError::Unprocessable(e.to_string()))?;
    let basket_id = BasketId::new(req.basket_id);

    // Own task: a client hanging up must not cancel a saga past its write.
    let outcome = tokio::spawn(async move {
        state
            .orchestrator
            .create_order(basket_id, ship_to)
            .await
    })
    .await
    .map_err(|e| ApiError::Internal(format!("order task failed: {e}")))??;

    Ok((StatusCode::CREATED, Json(OrderCreatedResponse::from(&outcome))))
}

/// GET /orders/{id}: load a placed order.
#[tracing::instrument(skip(state))]
pub async fn get<S: AppStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .orchestrator
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order not found: {order_id}")))?;

    Ok(Json(OrderResponse::from(&order)))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    uuid::Uuid::parse_str(id)
        .map(OrderId::from_uuid)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))
}
