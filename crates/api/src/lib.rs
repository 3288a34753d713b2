//! HTTP API server with observability for order fulfillment.
//!
//! Provides REST endpoints for creating orders from baskets and reading them
//! back, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod seed;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{CatalogUriComposer, PictureUriComposer};
use fulfillment::{
    InMemoryNotificationPublisher, InMemoryReservationClient, OrchestratorConfig, OrderOrchestrator,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::{AppState, AppStore, SharedNotificationPublisher, SharedReservationClient};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: AppStore>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state around the given collaborators.
pub fn create_state<S: AppStore>(
    store: S,
    reservation: SharedReservationClient,
    notification: SharedNotificationPublisher,
    composer: Arc<dyn PictureUriComposer>,
    config: OrchestratorConfig,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        orchestrator: OrderOrchestrator::new(store, reservation, notification, composer, config),
    })
}

/// Creates application state with in-memory reservation and notification fakes.
///
/// The fakes are returned so callers can inspect or fault them.
pub fn create_default_state<S: AppStore>(
    store: S,
) -> (
    Arc<AppState<S>>,
    InMemoryReservationClient,
    InMemoryNotificationPublisher,
) {
    let reservation = InMemoryReservationClient::new();
    let notification = InMemoryNotificationPublisher::new();

    let state = create_state(
        store,
        Arc::new(reservation.clone()),
        Arc::new(notification.clone()),
        Arc::new(CatalogUriComposer::new("http://localhost:3000")),
        OrchestratorConfig::default(),
    );

    (state, reservation, notification)
}
