//! Remote collaborators called after the order is persisted.

pub mod notification;
pub mod reservation;
pub mod retry;

pub use notification::{
    AmqpConfig, AmqpNotificationPublisher, InMemoryNotificationPublisher, NotificationError,
    NotificationPublisher, PublishAck, PublishedMessage,
};
pub use reservation::{
    HttpReservationClient, InMemoryReservationClient, ReservationAck, ReservationClient,
    ReservationClientConfig, ReservationError,
};
pub use retry::{RetryPolicy, RetryingNotificationPublisher, RetryingReservationClient};
