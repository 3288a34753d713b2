//! Order creation saga.
//!
//! Turns a buyer's basket into a persisted order, then asks the downstream
//! reservation systems to hold the stock:
//! 1. Validate the basket and resolve its catalog items
//! 2. Persist the order (the durability boundary)
//! 3. Call the reservation endpoint
//! 4. Publish a "reserve items" message
//!
//! Steps 3 and 4 never roll back the order. Their failures are logged and
//! reported as a pending outcome for out-of-band reconciliation.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod outcome;
pub mod services;
pub mod state;
pub mod steps;

pub use config::OrchestratorConfig;
pub use error::{FulfillmentError, Result, ValidationError};
pub use orchestrator::OrderOrchestrator;
pub use outcome::{OrderOutcome, OrderStatus, StepOutcome};
pub use services::{
    AmqpConfig, AmqpNotificationPublisher, HttpReservationClient, InMemoryNotificationPublisher,
    InMemoryReservationClient, NotificationError, NotificationPublisher, PublishAck,
    ReservationAck, ReservationClient, ReservationClientConfig, ReservationError, RetryPolicy,
    RetryingNotificationPublisher, RetryingReservationClient,
};
pub use state::FulfillmentStage;
