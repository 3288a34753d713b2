//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{BuyerId, OrderId};
use serde::{Deserialize, Serialize};

use super::{OrderError, OrderItem};
use crate::reservation::{ReservationLine, ReservationNotification, ReservationRequest};
use crate::value_objects::{Address, Money};

/// An order that has been built in memory but not yet written to the store.
///
/// Has no identifier: the store assigns one on `add`, turning it into an [`Order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    buyer_id: BuyerId,
    ship_to: Address,
    items: Vec<OrderItem>,
    total: Money,
    order_date: DateTime<Utc>,
}

/// Sum of unit price times quantity over all lines, checked for overflow.
fn checked_total(items: &[OrderItem]) -> Result<Money, OrderError> {
    items.iter().try_fold(Money::zero(), |total, item| {
        item.total_price()
            .and_then(|line| total.checked_add(line))
            .ok_or(OrderError::TotalOverflow)
    })
}

impl NewOrder {
    /// Creates a new order, rejecting empty item lists, zero quantities and
    /// totals that overflow.
    pub fn new(
        buyer_id: BuyerId,
        ship_to: Address,
        items: Vec<OrderItem>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }
        if let Some(item) = items.iter().find(|item| item.quantity == 0) {
            return Err(OrderError::InvalidQuantity {
                item_id: item.item_id,
            });
        }
        let total = checked_total(&items)?;

        Ok(Self {
            buyer_id,
            ship_to,
            items,
            total,
            order_date: Utc::now(),
        })
    }

    pub fn buyer_id(&self) -> &BuyerId {
        &self.buyer_id
    }

    pub fn ship_to(&self) -> &Address {
        &self.ship_to
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn order_date(&self) -> DateTime<Utc> {
        self.order_date
    }

    /// Sum of unit price times quantity over all lines.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Attaches the identifier assigned by the store.
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            buyer_id: self.buyer_id,
            ship_to: self.ship_to,
            items: self.items,
            total: self.total,
            order_date: self.order_date,
        }
    }
}

/// A persisted order.
///
/// Immutable once written; later fulfillment steps refer to it by [`OrderId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    buyer_id: BuyerId,
    ship_to: Address,
    items: Vec<OrderItem>,
    total: Money,
    order_date: DateTime<Utc>,
}

impl Order {
    /// Rebuilds an order from stored parts, recomputing its total.
    pub fn restore(
        id: OrderId,
        buyer_id: BuyerId,
        ship_to: Address,
        items: Vec<OrderItem>,
        order_date: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        let total = checked_total(&items)?;
        Ok(Self {
            id,
            buyer_id,
            ship_to,
            items,
            total,
            order_date,
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn buyer_id(&self) -> &BuyerId {
        &self.buyer_id
    }

    pub fn ship_to(&self) -> &Address {
        &self.ship_to
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn order_date(&self) -> DateTime<Utc> {
        self.order_date
    }

    pub fn total(&self) -> Money {
        self.total
    }

    fn reservation_lines(&self) -> Vec<ReservationLine> {
        self.items
            .iter()
            .map(|item| ReservationLine {
                item_id: item.item_id,
                quantity: item.quantity,
            })
            .collect()
    }

    /// Payload for the synchronous reservation endpoint.
    pub fn reservation_request(&self) -> ReservationRequest {
        ReservationRequest {
            order_id: self.id,
            ship_to_address: self.ship_to.clone(),
            final_price: self.total(),
            order_items: self.reservation_lines(),
        }
    }

    /// Payload for the "reserve items" queue message.
    pub fn reservation_notification(&self) -> ReservationNotification {
        ReservationNotification::new(self.id, self.reservation_lines())
    }
}
