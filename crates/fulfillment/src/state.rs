//! Per-invocation stage machine.

use serde::{Deserialize, Serialize};

/// How far a single order creation has progressed.
///
/// Stage transitions:
/// ```text
/// Validating ──► Building ──► Persisted ──► ReservationAttempted ──► NotificationAttempted ──► Done
/// ```
///
/// Failures before `Persisted` leave nothing behind. From `Persisted` on,
/// exactly one order exists and the run always reaches `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FulfillmentStage {
    /// Loading the basket and its catalog items.
    #[default]
    Validating,

    /// Assembling item snapshots and the in-memory order.
    Building,

    /// The order has been written.
    Persisted,

    /// The reservation call has finished, successfully or not.
    ReservationAttempted,

    /// The queue publish has finished, successfully or not.
    NotificationAttempted,

    /// Outcome reported to the caller (terminal state).
    Done,
}

impl FulfillmentStage {
    /// Returns true if `next` is the stage directly after this one.
    pub fn can_advance_to(&self, next: FulfillmentStage) -> bool {
        matches!(
            (self, next),
            (FulfillmentStage::Validating, FulfillmentStage::Building)
                | (FulfillmentStage::Building, FulfillmentStage::Persisted)
                | (FulfillmentStage::Persisted, FulfillmentStage::ReservationAttempted)
                | (
                    FulfillmentStage::ReservationAttempted,
                    FulfillmentStage::NotificationAttempted
                )
                | (FulfillmentStage::NotificationAttempted, FulfillmentStage::Done)
        )
    }

    /// Returns the stage name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStage::Validating => "validating",
            FulfillmentStage::Building => "building",
            FulfillmentStage::Persisted => "persisted",
            FulfillmentStage::ReservationAttempted => "reservation_attempted",
            FulfillmentStage::NotificationAttempted => "notification_attempted",
            FulfillmentStage::Done => "done",
        }
    }
}

impl std::fmt::Display for FulfillmentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
