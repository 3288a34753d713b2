//! Domain layer for order fulfillment.
//!
//! This crate provides the value types the order orchestration works with:
//! - Basket and catalog snapshots read from collaborator subsystems
//! - The Order aggregate, split into `NewOrder` (built) and `Order` (persisted)
//! - Reservation payloads derived from a persisted order
//! - Picture URI composition for order item snapshots

pub mod basket;
pub mod catalog;
pub mod order;
pub mod reservation;
pub mod value_objects;

pub use basket::{Basket, BasketItem};
pub use catalog::{CatalogItem, CatalogUriComposer, PictureUriComposer};
pub use order::{NewOrder, Order, OrderError, OrderItem, build_order_items};
pub use reservation::{ReservationLine, ReservationNotification, ReservationRequest};
pub use value_objects::{Address, AddressError, Money};
