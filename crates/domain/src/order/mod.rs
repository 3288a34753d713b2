//! Order aggregate and related types.

mod aggregate;
mod builder;
mod item;

pub use aggregate::{NewOrder, Order};
pub use builder::build_order_items;
pub use item::OrderItem;

use common::CatalogItemId;
use thiserror::Error;

/// Errors that can occur while building an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// A line has a zero quantity.
    #[error("Invalid quantity for catalog item {item_id}: must be greater than 0")]
    InvalidQuantity { item_id: CatalogItemId },

    /// Line or order total does not fit in a money amount.
    #[error("Order total overflows")]
    TotalOverflow,

    /// Basket lines reference catalog items that could not be resolved.
    #[error("Catalog items not found: {}", format_ids(.ids))]
    MissingCatalogItems { ids: Vec<CatalogItemId> },
}

fn format_ids(ids: &[CatalogItemId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
