//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` for JSON logs, anything else for text
/// - `DATABASE_URL`: PostgreSQL URL; the in-memory store is used when unset
/// - `RESERVATION_BASE_URL`: reservation endpoint base; an in-memory client is used when unset
/// - `RESERVATION_PATH`: path under the base (default: `api/CreateDeliveryItem`)
/// - `AMQP_URL`: broker URL; an in-memory publisher is used when unset
/// - `RESERVED_ITEMS_QUEUE`: queue name (default: `sbq-reserved-items`)
/// - `CATALOG_BASE_URL`: base replacing the catalog's picture placeholder
/// - `CALL_TIMEOUT_SECS`: per remote call limit (default: `10`)
/// - `ORDER_DEADLINE_SECS`: whole order creation limit (default: `30`)
/// - `RETRY_MAX_TIMES`: retries per remote call (default: `0`, disabled)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub reservation_base_url: Option<String>,
    pub reservation_path: String,
    pub amqp_url: Option<String>,
    pub reserved_items_queue: String,
    pub catalog_base_url: String,
    pub call_timeout: Duration,
    pub order_deadline: Duration,
    pub retry_max_times: usize,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let parsed = |key: &str| non_empty(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: non_empty("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.log_format),
            database_url: non_empty("DATABASE_URL"),
            reservation_base_url: non_empty("RESERVATION_BASE_URL"),
            reservation_path: non_empty("RESERVATION_PATH").unwrap_or(defaults.reservation_path),
            amqp_url: non_empty("AMQP_URL"),
            reserved_items_queue: non_empty("RESERVED_ITEMS_QUEUE")
                .unwrap_or(defaults.reserved_items_queue),
            catalog_base_url: non_empty("CATALOG_BASE_URL").unwrap_or(defaults.catalog_base_url),
            call_timeout: parsed("CALL_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.call_timeout),
            order_deadline: parsed("ORDER_DEADLINE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.order_deadline),
            retry_max_times: parsed("RETRY_MAX_TIMES")
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(defaults.retry_max_times),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            reservation_base_url: None,
            reservation_path: fulfillment::ReservationClientConfig::DEFAULT_PATH.to_string(),
            amqp_url: None,
            reserved_items_queue: fulfillment::AmqpConfig::DEFAULT_QUEUE.to_string(),
            catalog_base_url: "http://localhost:3000".to_string(),
            call_timeout: Duration::from_secs(10),
            order_deadline: Duration::from_secs(30),
            retry_max_times: 0,
        }
    }
}
