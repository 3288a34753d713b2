//! Order line snapshot.

use common::CatalogItemId;
use serde::{Deserialize, Serialize};

use crate::value_objects::Money;

/// Immutable snapshot of an ordered item.
///
/// Name and picture are copied from the catalog at order time, so later
/// catalog edits never change a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub item_id: CatalogItemId,
    pub name: String,
    pub picture_uri: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl OrderItem {
    pub fn new(
        item_id: impl Into<CatalogItemId>,
        name: impl Into<String>,
        picture_uri: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            name: name.into(),
            picture_uri: picture_uri.into(),
            unit_price,
            quantity,
        }
    }

    /// Returns the total price for this line (quantity * unit_price),
    /// or `None` if it does not fit in a [`Money`].
    pub fn total_price(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_item_total_price() {
        let item = OrderItem::new(1, "Mug", "/1.png", Money::from_cents(1000), 3);
        assert_eq!(item.total_price(), Some(Money::from_cents(3000)));
    }

    #[test]
    fn test_order_item_total_price_overflow() {
        let item = OrderItem::new(1, "Mug", "/1.png", Money::from_cents(i64::MAX / 2), 3);
        assert_eq!(item.total_price(), None);
    }
}
