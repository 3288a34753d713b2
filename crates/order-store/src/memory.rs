use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{BasketId, CatalogItemId, OrderId};
use domain::{Basket, CatalogItem, NewOrder, Order};
use tokio::sync::RwLock;

use crate::{BasketReader, CatalogReader, OrderStore, Result, StoreError};

#[derive(Default)]
struct InMemoryState {
    baskets: HashMap<BasketId, Basket>,
    catalog: HashMap<CatalogItemId, CatalogItem>,
    /// Orders in insertion order.
    orders: Vec<Order>,
}

/// In-memory store implementing every collaborator trait.
///
/// Used by tests and by the API server when no database is configured.
/// Clones share the same underlying state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<InMemoryState>>,
    fail_on_add: Arc<AtomicBool>,
    fail_on_read: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a basket.
    pub async fn insert_basket(&self, basket: Basket) {
        self.state.write().await.baskets.insert(basket.id, basket);
    }

    /// Inserts or replaces a catalog record.
    pub async fn insert_catalog_item(&self, item: CatalogItem) {
        self.state.write().await.catalog.insert(item.id, item);
    }

    /// Configures `add` to fail as if the store were unreachable.
    pub fn set_fail_on_add(&self, fail: bool) {
        self.fail_on_add.store(fail, Ordering::SeqCst);
    }

    /// Configures basket and catalog reads to fail as if the store were unreachable.
    pub fn set_fail_on_read(&self, fail: bool) {
        self.fail_on_read.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns all stored orders in insertion order.
    pub async fn orders(&self) -> Vec<Order> {
        self.state.read().await.orders.clone()
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_on_read.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("read refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BasketReader for InMemoryStore {
    async fn find_basket_with_items(&self, basket_id: BasketId) -> Result<Option<Basket>> {
        self.check_reads()?;
        Ok(self.state.read().await.baskets.get(&basket_id).cloned())
    }
}

#[async_trait]
impl CatalogReader for InMemoryStore {
    async fn find_catalog_items(&self, ids: &[CatalogItemId]) -> Result<Vec<CatalogItem>> {
        self.check_reads()?;
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.catalog.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn add(&self, order: &NewOrder) -> Result<OrderId> {
        if self.fail_on_add.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write refused".to_string()));
        }

        let order_id = OrderId::new();
        self.state
            .write()
            .await
            .orders
            .push(order.clone().into_order(order_id));
        Ok(order_id)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self
            .state
            .read()
            .await
            .orders
            .iter()
            .find(|o| o.id() == order_id)
            .cloned())
    }
}
