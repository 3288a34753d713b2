//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat};
use api::routes::orders::{SharedNotificationPublisher, SharedReservationClient};
use domain::CatalogUriComposer;
use fulfillment::{
    AmqpConfig, AmqpNotificationPublisher, HttpReservationClient, InMemoryNotificationPublisher,
    InMemoryReservationClient, OrchestratorConfig, ReservationClientConfig, RetryPolicy,
    RetryingNotificationPublisher, RetryingReservationClient,
};
use order_store::{InMemoryStore, PostgresStore};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn retry_policy(config: &Config) -> RetryPolicy {
    RetryPolicy::default().with_max_times(config.retry_max_times)
}

fn reservation_client(config: &Config) -> SharedReservationClient {
    let Some(base_url) = &config.reservation_base_url else {
        tracing::warn!("RESERVATION_BASE_URL not set, reservations go to an in-memory client");
        return Arc::new(InMemoryReservationClient::new());
    };

    let client_config = ReservationClientConfig::new(base_url).with_path(&config.reservation_path);
    let client =
        HttpReservationClient::new(&client_config).expect("failed to build reservation client");
    tracing::info!(endpoint = client.endpoint(), "using HTTP reservation client");

    Arc::new(RetryingReservationClient::new(client, retry_policy(config)))
}

async fn notification_publisher(config: &Config) -> SharedNotificationPublisher {
    let Some(url) = &config.amqp_url else {
        tracing::warn!("AMQP_URL not set, reservation notifications go to an in-memory publisher");
        return Arc::new(InMemoryNotificationPublisher::new());
    };

    let amqp_config = AmqpConfig::new(url).with_queue(&config.reserved_items_queue);
    let publisher = AmqpNotificationPublisher::connect(amqp_config)
        .await
        .expect("failed to connect to AMQP broker");

    Arc::new(RetryingNotificationPublisher::new(
        publisher,
        retry_policy(config),
    ))
}

async fn serve(config: &Config, app: axum::Router) {
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Remote collaborators
    let reservation = reservation_client(&config);
    let notification = notification_publisher(&config).await;
    let composer = Arc::new(CatalogUriComposer::new(&config.catalog_base_url));
    let orchestrator_config = OrchestratorConfig::new(config.call_timeout, config.order_deadline);

    // 4. Store, state and router
    let app = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("failed to connect to database");
            let store = PostgresStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL store");

            let state = api::create_state(
                store,
                reservation,
                notification,
                composer,
                orchestrator_config,
            );
            api::create_app(state, metrics_handle)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store with demo data");
            let store = InMemoryStore::new();
            api::seed::seed_demo_data(&store).await;

            let state = api::create_state(
                store,
                reservation,
                notification,
                composer,
                orchestrator_config,
            );
            api::create_app(state, metrics_handle)
        }
    };

    // 5. Start server
    serve(&config, app).await;
}
