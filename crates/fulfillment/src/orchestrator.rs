//! Order orchestrator: basket in, persisted order plus reservation status out.

use std::sync::Arc;
use std::time::Duration;

use common::{BasketId, OrderId};
use domain::{Address, NewOrder, Order, OrderError, PictureUriComposer, build_order_items};
use order_store::{BasketReader, CatalogReader, OrderStore};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error, info, warn};

use crate::config::OrchestratorConfig;
use crate::error::{FulfillmentError, Result, ValidationError};
use crate::outcome::{OrderOutcome, StepOutcome};
use crate::services::notification::{NotificationError, NotificationPublisher};
use crate::services::reservation::{ReservationClient, ReservationError};
use crate::state::FulfillmentStage;
use crate::steps::{STEP_NOTIFY_RESERVED_ITEMS, STEP_RESERVE_ITEMS};

/// Drives the order creation saga.
///
/// Validation and persistence failures abort with an error and leave no order.
/// Once the order is written, reservation and notification failures are
/// logged and folded into a pending [`OrderOutcome`]; the order is never
/// rolled back.
pub struct OrderOrchestrator<S, R, N>
where
    S: BasketReader + CatalogReader + OrderStore,
    R: ReservationClient,
    N: NotificationPublisher,
{
    store: S,
    reservation: R,
    notification: N,
    composer: Arc<dyn PictureUriComposer>,
    config: OrchestratorConfig,
}

impl<S, R, N> OrderOrchestrator<S, R, N>
where
    S: BasketReader + CatalogReader + OrderStore,
    R: ReservationClient,
    N: NotificationPublisher,
{
    pub fn new(
        store: S,
        reservation: R,
        notification: N,
        composer: Arc<dyn PictureUriComposer>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            reservation,
            notification,
            composer,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Loads a previously created order.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        self.store
            .get_order(order_id)
            .await
            .map_err(FulfillmentError::Lookup)
    }

    /// Creates an order from the basket and ships it to `ship_to`.
    ///
    /// Each call writes a new order; calling twice with the same basket
    /// creates two orders.
    #[tracing::instrument(skip_all, fields(basket_id = %basket_id))]
    pub async fn create_order(&self, basket_id: BasketId, ship_to: Address) -> Result<OrderOutcome> {
        let started = std::time::Instant::now();
        let deadline = Instant::now() + self.config.deadline;

        let result = self.run(basket_id, ship_to, deadline).await;

        metrics::histogram!("order_creation_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(outcome) => {
                metrics::counter!("orders_created_total").increment(1);
                for step in outcome.pending_steps() {
                    metrics::counter!("order_fulfillment_pending_total", "step" => step)
                        .increment(1);
                }
                if outcome.is_confirmed() {
                    info!(
                        order_id = %outcome.order_id,
                        total = %outcome.total,
                        "order created"
                    );
                } else {
                    warn!(
                        order_id = %outcome.order_id,
                        total = %outcome.total,
                        pending_steps = ?outcome.pending_steps(),
                        "order created with pending steps"
                    );
                }
            }
            Err(err) => {
                metrics::counter!("order_creation_failed_total", "reason" => err.reason())
                    .increment(1);
                match err {
                    FulfillmentError::Validation(
                        ValidationError::BasketNotFound(_)
                        | ValidationError::EmptyBasket(_)
                        | ValidationError::InvalidQuantity { .. }
                        | ValidationError::TotalOverflow(_),
                    ) => warn!(error = %err, "order rejected"),
                    _ => error!(
                        error = %err,
                        retryable = err.is_retryable(),
                        "order creation failed"
                    ),
                }
            }
        }

        result
    }

    async fn run(
        &self,
        basket_id: BasketId,
        ship_to: Address,
        deadline: Instant,
    ) -> Result<OrderOutcome> {
        let mut stage = FulfillmentStage::Validating;

        let basket = timeout_at(deadline, self.store.find_basket_with_items(basket_id))
            .await
            .map_err(|_| FulfillmentError::DeadlineExceeded { stage })?
            .map_err(FulfillmentError::Lookup)?
            .ok_or(ValidationError::BasketNotFound(basket_id))?;

        if basket.is_empty() {
            return Err(ValidationError::EmptyBasket(basket_id).into());
        }

        let catalog_items = timeout_at(
            deadline,
            self.store.find_catalog_items(&basket.catalog_item_ids()),
        )
        .await
        .map_err(|_| FulfillmentError::DeadlineExceeded { stage })?
        .map_err(FulfillmentError::Lookup)?;

        advance(&mut stage, FulfillmentStage::Building);

        let items = build_order_items(&basket, &catalog_items, self.composer.as_ref())
            .map_err(|e| validation_error(basket_id, e))?;
        let new_order = NewOrder::new(basket.buyer_id.clone(), ship_to, items)
            .map_err(|e| validation_error(basket_id, e))?;

        if Instant::now() >= deadline {
            return Err(FulfillmentError::DeadlineExceeded { stage });
        }

        // Not raced against the deadline: a cancelled write could leave an
        // order the caller was told does not exist.
        let order_id = self
            .store
            .add(&new_order)
            .await
            .map_err(FulfillmentError::Persistence)?;
        let order = new_order.into_order(order_id);
        advance(&mut stage, FulfillmentStage::Persisted);

        let reservation = self.reserve_items(&order, deadline).await;
        advance(&mut stage, FulfillmentStage::ReservationAttempted);

        let notification = self.notify_reserved_items(&order, deadline).await;
        advance(&mut stage, FulfillmentStage::NotificationAttempted);

        advance(&mut stage, FulfillmentStage::Done);

        Ok(OrderOutcome {
            order_id,
            total: order.total(),
            reservation,
            notification,
        })
    }

    async fn reserve_items(
        &self,
        order: &Order,
        deadline: Instant,
    ) -> StepOutcome<ReservationError> {
        let Some((step_deadline, budget)) = self.step_window(deadline) else {
            log_skipped(order.id(), STEP_RESERVE_ITEMS);
            return StepOutcome::Skipped;
        };

        let request = order.reservation_request();
        let result = match timeout_at(step_deadline, self.reservation.reserve(&request, budget)).await
        {
            Ok(result) => result,
            Err(_) => Err(ReservationError::Timeout(budget)),
        };

        match result {
            Ok(ack) => {
                debug!(order_id = %order.id(), status = ack.status, "items reserved");
                StepOutcome::Succeeded
            }
            Err(err) => {
                error!(
                    order_id = %order.id(),
                    step = STEP_RESERVE_ITEMS,
                    error = %err,
                    "reservation failed, order left pending"
                );
                StepOutcome::Failed(err)
            }
        }
    }

    async fn notify_reserved_items(
        &self,
        order: &Order,
        deadline: Instant,
    ) -> StepOutcome<NotificationError> {
        let Some((step_deadline, budget)) = self.step_window(deadline) else {
            log_skipped(order.id(), STEP_NOTIFY_RESERVED_ITEMS);
            return StepOutcome::Skipped;
        };

        let notification = order.reservation_notification();
        let result = match timeout_at(step_deadline, self.notification.publish(&notification)).await
        {
            Ok(result) => result,
            Err(_) => Err(NotificationError::Timeout(budget)),
        };

        match result {
            Ok(ack) => {
                debug!(order_id = %order.id(), queue = %ack.queue, "reservation notification published");
                StepOutcome::Succeeded
            }
            Err(err) => {
                error!(
                    order_id = %order.id(),
                    step = STEP_NOTIFY_RESERVED_ITEMS,
                    error = %err,
                    "notification failed, order left pending"
                );
                StepOutcome::Failed(err)
            }
        }
    }

    /// Deadline and time budget for the next remote call, or `None` once the
    /// overall deadline has passed.
    fn step_window(&self, deadline: Instant) -> Option<(Instant, Duration)> {
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        let step_deadline = std::cmp::min(now + self.config.call_timeout, deadline);
        Some((step_deadline, step_deadline - now))
    }
}

fn advance(stage: &mut FulfillmentStage, next: FulfillmentStage) {
    debug_assert!(stage.can_advance_to(next), "{stage} -> {next}");
    *stage = next;
    debug!(stage = %next, "stage reached");
}

fn log_skipped(order_id: OrderId, step: &'static str) {
    error!(
        %order_id,
        step,
        error = "deadline exhausted before the step started",
        "step skipped, order left pending"
    );
}

fn validation_error(basket_id: BasketId, err: OrderError) -> ValidationError {
    match err {
        OrderError::NoItems => ValidationError::EmptyBasket(basket_id),
        OrderError::InvalidQuantity { item_id } => {
            ValidationError::InvalidQuantity { basket_id, item_id }
        }
        OrderError::MissingCatalogItems { ids } => {
            ValidationError::CatalogItemMissing { basket_id, ids }
        }
        OrderError::TotalOverflow => ValidationError::TotalOverflow(basket_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::OrderStatus;
    use crate::services::notification::InMemoryNotificationPublisher;
    use crate::services::reservation::InMemoryReservationClient;
    use common::CatalogItemId;
    use domain::{Basket, BasketItem, CatalogItem, CatalogUriComposer, Money};
    use order_store::{InMemoryStore, StoreError};

    type TestOrchestrator =
        OrderOrchestrator<InMemoryStore, InMemoryReservationClient, InMemoryNotificationPublisher>;

    struct Fixture {
        orchestrator: TestOrchestrator,
        store: InMemoryStore,
        reservation: InMemoryReservationClient,
        notification: InMemoryNotificationPublisher,
    }

    async fn setup_with(config: OrchestratorConfig) -> Fixture {
        let store = InMemoryStore::new();
        let reservation = InMemoryReservationClient::new();
        let notification = InMemoryNotificationPublisher::new();

        store
            .insert_catalog_item(CatalogItem::new(
                1,
                "Mug",
                "http://catalogbaseurltobereplaced/images/products/1.png",
            ))
            .await;
        store
            .insert_catalog_item(CatalogItem::new(2, "Shirt", "https://cdn.example.com/2.png"))
            .await;
        store
            .insert_basket(
                Basket::new(1, "buyer@example.com")
                    .with_item(BasketItem::new(1, Money::from_dollars(10), 2))
                    .with_item(BasketItem::new(2, Money::from_dollars(5), 1)),
            )
            .await;

        let orchestrator = OrderOrchestrator::new(
            store.clone(),
            reservation.clone(),
            notification.clone(),
            Arc::new(CatalogUriComposer::new("https://cdn.example.com")),
            config,
        );

        Fixture {
            orchestrator,
            store,
            reservation,
            notification,
        }
    }

    async fn setup() -> Fixture {
        setup_with(OrchestratorConfig::default()).await
    }

    fn address() -> Address {
        Address::new("1 Main St", "Redmond", "WA", "US", "98052").unwrap()
    }

    #[tokio::test]
    async fn test_happy_path() {
        let f = setup().await;

        let outcome = f
            .orchestrator
            .create_order(BasketId::new(1), address())
            .await
            .unwrap();

        assert_eq!(outcome.status(), OrderStatus::Confirmed);
        assert_eq!(outcome.total, Money::from_dollars(25));

        let order = f.orchestrator.get_order(outcome.order_id).await.unwrap().unwrap();
        assert_eq!(order.buyer_id().as_str(), "buyer@example.com");
        assert_eq!(order.items().len(), 2);
        assert_eq!(
            order.items()[0].picture_uri,
            "https://cdn.example.com/images/products/1.png"
        );

        assert_eq!(f.reservation.request_count(), 1);
        assert_eq!(f.reservation.requests()[0].order_id, outcome.order_id);
        assert_eq!(f.notification.message_count(), 1);
    }

    #[tokio::test]
    async fn test_basket_not_found() {
        let f = setup().await;

        let result = f.orchestrator.create_order(BasketId::new(99), address()).await;

        assert!(matches!(
            result,
            Err(FulfillmentError::Validation(ValidationError::BasketNotFound(id))) if id == BasketId::new(99)
        ));
        assert_eq!(f.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_zero_quantity_line_is_rejected() {
        let f = setup().await;
        f.store
            .insert_basket(Basket::new(2, "buyer").with_item(BasketItem::new(1, Money::from_cents(100), 0)))
            .await;

        let result = f.orchestrator.create_order(BasketId::new(2), address()).await;

        assert!(matches!(
            result,
            Err(FulfillmentError::Validation(ValidationError::InvalidQuantity { item_id, .. }))
                if item_id == CatalogItemId::new(1)
        ));
        assert_eq!(f.store.order_count().await, 0);
        assert_eq!(f.reservation.request_count(), 0);
    }

    #[tokio::test]
    async fn test_read_failure_is_lookup_error() {
        let f = setup().await;
        f.store.set_fail_on_read(true);

        let result = f.orchestrator.create_order(BasketId::new(1), address()).await;

        assert!(matches!(
            result,
            Err(FulfillmentError::Lookup(StoreError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_reservation_timeout_keeps_order() {
        let f = setup_with(OrchestratorConfig::new(
            Duration::from_millis(50),
            Duration::from_secs(5),
        ))
        .await;
        f.reservation.set_latency(Duration::from_secs(2));

        let outcome = f
            .orchestrator
            .create_order(BasketId::new(1), address())
            .await
            .unwrap();

        assert!(matches!(
            outcome.reservation,
            StepOutcome::Failed(ReservationError::Timeout(_))
        ));
        assert!(outcome.notification.is_succeeded());
        assert_eq!(f.store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_exhausted_deadline_skips_notification() {
        let f = setup_with(OrchestratorConfig::new(
            Duration::from_secs(5),
            Duration::from_millis(100),
        ))
        .await;
        f.reservation.set_latency(Duration::from_secs(2));

        let outcome = f
            .orchestrator
            .create_order(BasketId::new(1), address())
            .await
            .unwrap();

        assert!(matches!(
            outcome.reservation,
            StepOutcome::Failed(ReservationError::Timeout(_))
        ));
        assert!(matches!(outcome.notification, StepOutcome::Skipped));
        assert_eq!(outcome.status(), OrderStatus::Pending);
        assert_eq!(f.notification.message_count(), 0);
        assert_eq!(f.store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_slow_notification_times_out() {
        let f = setup_with(OrchestratorConfig::new(
            Duration::from_millis(50),
            Duration::from_secs(5),
        ))
        .await;
        f.notification.set_latency(Duration::from_secs(2));

        let outcome = f
            .orchestrator
            .create_order(BasketId::new(1), address())
            .await
            .unwrap();

        assert!(outcome.reservation.is_succeeded());
        assert!(matches!(
            outcome.notification,
            StepOutcome::Failed(NotificationError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_overflowing_total_is_rejected_before_write() {
        let f = setup().await;
        f.store
            .insert_basket(
                Basket::new(3, "buyer").with_item(BasketItem::new(
                    1,
                    Money::from_cents(i64::MAX / 2),
                    3,
                )),
            )
            .await;

        let result = f.orchestrator.create_order(BasketId::new(3), address()).await;

        assert!(matches!(
            result,
            Err(FulfillmentError::Validation(ValidationError::TotalOverflow(id))) if id == BasketId::new(3)
        ));
        assert_eq!(f.store.order_count().await, 0);
        assert_eq!(f.reservation.request_count(), 0);
        assert_eq!(f.notification.message_count(), 0);
    }

    #[test]
    fn test_validation_error_mapping() {
        let basket_id = BasketId::new(5);
        assert_eq!(
            validation_error(basket_id, OrderError::NoItems),
            ValidationError::EmptyBasket(basket_id)
        );
        assert_eq!(
            validation_error(
                basket_id,
                OrderError::MissingCatalogItems {
                    ids: vec![CatalogItemId::new(3)]
                }
            ),
            ValidationError::CatalogItemMissing {
                basket_id,
                ids: vec![CatalogItemId::new(3)]
            }
        );
        assert_eq!(
            validation_error(basket_id, OrderError::TotalOverflow),
            ValidationError::TotalOverflow(basket_id)
        );
    }
}
