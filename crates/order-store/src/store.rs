use async_trait::async_trait;
use common::{BasketId, CatalogItemId, OrderId};
use domain::{Basket, CatalogItem, NewOrder, Order};

use crate::Result;

/// Read access to the basket subsystem.
#[async_trait]
pub trait BasketReader: Send + Sync {
    /// Loads a basket together with its items.
    ///
    /// Returns None if no basket has this ID.
    async fn find_basket_with_items(&self, basket_id: BasketId) -> Result<Option<Basket>>;
}

/// Read access to the catalog.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Loads the catalog records for a set of IDs in one batched read.
    ///
    /// Unknown IDs are silently absent from the result; callers decide
    /// whether that is an error. Result order is unspecified.
    async fn find_catalog_items(&self, ids: &[CatalogItemId]) -> Result<Vec<CatalogItem>>;
}

/// Durable storage of orders.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order and returns the identifier assigned to it.
    ///
    /// The write is atomic: either the order and all its items are stored,
    /// or nothing is.
    async fn add(&self, order: &NewOrder) -> Result<OrderId>;

    /// Loads a persisted order.
    ///
    /// Returns None if the order doesn't exist.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;
}
