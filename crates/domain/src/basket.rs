//! Basket snapshot as read from the basket subsystem.

use common::{BasketId, BuyerId, CatalogItemId};
use serde::{Deserialize, Serialize};

use crate::value_objects::Money;

/// A line in a basket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketItem {
    pub catalog_item_id: CatalogItemId,
    /// Price captured when the item was put in the basket.
    pub unit_price: Money,
    pub quantity: u32,
}

impl BasketItem {
    pub fn new(catalog_item_id: impl Into<CatalogItemId>, unit_price: Money, quantity: u32) -> Self {
        Self {
            catalog_item_id: catalog_item_id.into(),
            unit_price,
            quantity,
        }
    }
}

/// A buyer's basket with its items, in the order they were added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Basket {
    pub id: BasketId,
    pub buyer_id: BuyerId,
    pub items: Vec<BasketItem>,
}

impl Basket {
    pub fn new(id: impl Into<BasketId>, buyer_id: impl Into<BuyerId>) -> Self {
        Self {
            id: id.into(),
            buyer_id: buyer_id.into(),
            items: Vec::new(),
        }
    }

    /// Builder-style helper used when seeding baskets.
    pub fn with_item(mut self, item: BasketItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct catalog item IDs referenced by the basket, in first-seen order.
    pub fn catalog_item_ids(&self) -> Vec<CatalogItemId> {
        let mut ids = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if !ids.contains(&item.catalog_item_id) {
                ids.push(item.catalog_item_id);
            }
        }
        ids
    }
}
