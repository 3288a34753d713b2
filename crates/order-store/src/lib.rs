//! Collaborator stores used by order fulfillment.
//!
//! The orchestrator only reads baskets and catalog records and appends orders;
//! the traits here are its whole view of persistence.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{BasketReader, CatalogReader, OrderStore};
