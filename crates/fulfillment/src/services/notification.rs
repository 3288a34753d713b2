//! "Reserve items" queue publisher: AMQP implementation and in-memory fake.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use domain::ReservationNotification;
use deadpool_lapin::{Manager, Pool, PoolError};
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, ConnectionProperties};
use thiserror::Error;
use tracing::{debug, info};

/// A message the broker has accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishAck {
    /// Queue the message was routed to.
    pub queue: String,
}

/// Errors from publishing a notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The payload could not be serialized.
    #[error("Failed to serialize notification: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The broker could not be reached or refused the message.
    #[error("Failed to send notification: {0}")]
    Send(String),

    /// No broker confirmation within the allowed time.
    #[error("Notification timed out after {0:?}")]
    Timeout(Duration),
}

impl NotificationError {
    /// Only send failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NotificationError::Send(_))
    }
}

/// Publishes one "reserve items" message per order.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(
        &self,
        notification: &ReservationNotification,
    ) -> Result<PublishAck, NotificationError>;
}

#[async_trait]
impl<T: NotificationPublisher + ?Sized> NotificationPublisher for Arc<T> {
    async fn publish(
        &self,
        notification: &ReservationNotification,
    ) -> Result<PublishAck, NotificationError> {
        (**self).publish(notification).await
    }
}

/// Broker connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmqpConfig {
    pub url: String,
    pub queue: String,
    /// Upper bound on pooled broker connections.
    pub pool_size: usize,
}

impl AmqpConfig {
    pub const DEFAULT_QUEUE: &'static str = "sbq-reserved-items";
    pub const DEFAULT_POOL_SIZE: usize = 4;

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            queue: Self::DEFAULT_QUEUE.to_string(),
            pool_size: Self::DEFAULT_POOL_SIZE,
        }
    }

    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }
}

/// Publisher sending persistent JSON messages to a durable AMQP queue.
///
/// Uses the default exchange, so the routing key is the queue name.
/// Every publish takes a connection from the pool and opens its own
/// confirm-mode channel; the pool drops connections that have closed and
/// dials new ones, so a broker restart only fails the publishes in flight.
/// A broker nack is reported as a send failure.
pub struct AmqpNotificationPublisher {
    pool: Pool,
    queue: String,
}

impl AmqpNotificationPublisher {
    /// Builds the pool, checks the broker is reachable and declares the queue.
    pub async fn connect(config: AmqpConfig) -> Result<Self, NotificationError> {
        let manager = Manager::new(config.url.clone(), ConnectionProperties::default());
        let pool = Pool::builder(manager)
            .max_size(config.pool_size)
            .build()
            .map_err(|e| NotificationError::Send(format!("Failed to create pool: {e}")))?;

        let publisher = Self {
            pool,
            queue: config.queue,
        };

        let channel = publisher.open_channel().await?;
        channel
            .queue_declare(
                &publisher.queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| NotificationError::Send(format!("Failed to declare queue: {e}")))?;
        close_channel(channel).await;

        info!(queue = %publisher.queue, "connected to AMQP");
        Ok(publisher)
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Fresh confirm-mode channel on a live pooled connection.
    async fn open_channel(&self) -> Result<Channel, NotificationError> {
        let connection = self.pool.get().await.map_err(|e: PoolError| {
            NotificationError::Send(format!("Failed to get connection from pool: {e}"))
        })?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| NotificationError::Send(format!("Failed to create channel: {e}")))?;

        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| NotificationError::Send(format!("Failed to enable confirms: {e}")))?;

        Ok(channel)
    }
}

async fn close_channel(channel: Channel) {
    if let Err(e) = channel.close(200, "OK").await {
        debug!(error = %e, "channel close failed");
    }
}

#[async_trait]
impl NotificationPublisher for AmqpNotificationPublisher {
    #[tracing::instrument(skip_all, fields(order_id = %notification.order_id(), queue = %self.queue))]
    async fn publish(
        &self,
        notification: &ReservationNotification,
    ) -> Result<PublishAck, NotificationError> {
        let payload = serde_json::to_vec(notification)?;

        let properties = BasicProperties::default()
            .with_content_type("application/json".into())
            .with_delivery_mode(2) // persistent
            .with_message_id(notification.order_id().to_string().into());

        let channel = self.open_channel().await?;
        let confirmation = channel
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                &payload,
                properties,
            )
            .await
            .map_err(|e| NotificationError::Send(format!("Failed to publish: {e}")))?
            .await
            .map_err(|e| NotificationError::Send(format!("Publish confirmation failed: {e}")))?;
        close_channel(channel).await;

        if confirmation.is_nack() {
            return Err(NotificationError::Send("Broker rejected message".to_string()));
        }

        debug!(bytes = payload.len(), "notification published");
        Ok(PublishAck {
            queue: self.queue.clone(),
        })
    }
}

/// A message captured by [`InMemoryNotificationPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub message_id: String,
    /// JSON body exactly as it would go on the wire.
    pub body: String,
}

#[derive(Debug, Default)]
struct InMemoryPublisherState {
    messages: Vec<PublishedMessage>,
    latency: Duration,
}

/// In-memory publisher for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationPublisher {
    state: Arc<Mutex<InMemoryPublisherState>>,
    fail_on_publish: Arc<AtomicBool>,
}

impl InMemoryNotificationPublisher {
    pub const QUEUE: &'static str = "in-memory";

    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the publisher to fail every publish call.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.fail_on_publish.store(fail, Ordering::SeqCst);
    }

    /// Delays every publish.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    /// Returns the number of messages published.
    pub fn message_count(&self) -> usize {
        self.lock().messages.len()
    }

    /// Returns every published message, oldest first.
    pub fn messages(&self) -> Vec<PublishedMessage> {
        self.lock().messages.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryPublisherState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl NotificationPublisher for InMemoryNotificationPublisher {
    async fn publish(
        &self,
        notification: &ReservationNotification,
    ) -> Result<PublishAck, NotificationError> {
        let body = serde_json::to_string(notification)?;

        let latency = self.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.fail_on_publish.load(Ordering::SeqCst) {
            return Err(NotificationError::Send("broker unavailable".to_string()));
        }

        self.lock().messages.push(PublishedMessage {
            message_id: notification.order_id().to_string(),
            body,
        });
        Ok(PublishAck {
            queue: Self::QUEUE.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{CatalogItemId, OrderId};
    use domain::ReservationLine;

    fn notification() -> ReservationNotification {
        ReservationNotification::new(
            OrderId::new(),
            vec![ReservationLine {
                item_id: CatalogItemId::new(4),
                quantity: 2,
            }],
        )
    }

    #[test]
    fn test_default_queue_name() {
        let config = AmqpConfig::new("amqp://localhost:5672/%2f");
        assert_eq!(config.queue, "sbq-reserved-items");
        assert_eq!(config.pool_size, AmqpConfig::DEFAULT_POOL_SIZE);
        assert_eq!(config.with_queue("other").queue, "other");
    }

    #[test]
    fn test_only_send_failures_are_retryable() {
        assert!(NotificationError::Send("down".into()).is_retryable());
        assert!(!NotificationError::Timeout(Duration::from_secs(1)).is_retryable());
    }

    #[tokio::test]
    async fn test_unreachable_broker_is_a_send_error() {
        let result = AmqpNotificationPublisher::connect(AmqpConfig::new("amqp://127.0.0.1:1/%2f")).await;

        assert!(matches!(result, Err(NotificationError::Send(_))));
    }

    #[tokio::test]
    async fn test_in_memory_records_wire_body_and_message_id() {
        let publisher = InMemoryNotificationPublisher::new();
        let notification = notification();

        let ack = publisher.publish(&notification).await.unwrap();

        assert_eq!(ack.queue, InMemoryNotificationPublisher::QUEUE);
        let messages = publisher.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_id, notification.order_id().to_string());
        assert_eq!(messages[0].body, r#"[{"itemId":4,"quantity":2}]"#);
    }

    #[tokio::test]
    async fn test_in_memory_failure_records_nothing() {
        let publisher = InMemoryNotificationPublisher::new();
        publisher.set_fail_on_publish(true);

        let err = publisher.publish(&notification()).await.unwrap_err();

        assert!(matches!(err, NotificationError::Send(_)));
        assert_eq!(publisher.message_count(), 0);
    }
}
