//! Opt-in retry decorators for the remote clients.
//!
//! Uses `backon` for exponential backoff with jitter. Retries wrap single
//! remote calls only; a whole order creation is never replayed, since that
//! would write a second order.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use domain::{ReservationNotification, ReservationRequest};
use tracing::warn;

use super::notification::{NotificationError, NotificationPublisher, PublishAck};
use super::reservation::{ReservationAck, ReservationClient, ReservationError};

/// Backoff settings for a retrying client.
///
/// `max_times` counts retries after the first attempt; zero disables retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_times: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_max_times(mut self, max_times: usize) -> Self {
        self.max_times = max_times;
        self
    }

    pub fn with_delays(mut self, min_delay: Duration, max_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self.max_delay = max_delay;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.max_times > 0
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_times)
            .with_jitter()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_times: 0,
            min_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

/// Reservation client that retries transient failures of an inner client.
///
/// Retries transport errors, timeouts and 429/5xx rejections.
#[derive(Debug, Clone)]
pub struct RetryingReservationClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: ReservationClient> RetryingReservationClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<C: ReservationClient> ReservationClient for RetryingReservationClient<C> {
    async fn reserve(
        &self,
        request: &ReservationRequest,
        timeout: Duration,
    ) -> Result<ReservationAck, ReservationError> {
        if !self.policy.is_enabled() {
            return self.inner.reserve(request, timeout).await;
        }

        (|| self.inner.reserve(request, timeout))
            .retry(self.policy.backoff())
            .when(ReservationError::is_retryable)
            .notify(|err: &ReservationError, delay: Duration| {
                warn!(order_id = %request.order_id, error = %err, ?delay, "retrying reservation");
            })
            .await
    }
}

/// Publisher that retries send failures of an inner publisher.
#[derive(Debug, Clone)]
pub struct RetryingNotificationPublisher<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P: NotificationPublisher> RetryingNotificationPublisher<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<P: NotificationPublisher> NotificationPublisher for RetryingNotificationPublisher<P> {
    async fn publish(
        &self,
        notification: &ReservationNotification,
    ) -> Result<PublishAck, NotificationError> {
        if !self.policy.is_enabled() {
            return self.inner.publish(notification).await;
        }

        (|| self.inner.publish(notification))
            .retry(self.policy.backoff())
            .when(NotificationError::is_retryable)
            .notify(|err: &NotificationError, delay: Duration| {
                warn!(order_id = %notification.order_id(), error = %err, ?delay, "retrying notification");
            })
            .await
    }
}
