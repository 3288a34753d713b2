//! Result of a successful order creation.

use common::OrderId;
use domain::Money;
use serde::{Deserialize, Serialize};

use crate::services::{NotificationError, ReservationError};
use crate::steps::{STEP_NOTIFY_RESERVED_ITEMS, STEP_RESERVE_ITEMS};

/// What happened to a post-persist step.
#[derive(Debug)]
pub enum StepOutcome<E> {
    Succeeded,
    Failed(E),
    /// The overall deadline ran out before the step could start.
    Skipped,
}

impl<E> StepOutcome<E> {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, StepOutcome::Succeeded)
    }

    /// The step's error, if it ran and failed.
    pub fn error(&self) -> Option<&E> {
        match self {
            StepOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepOutcome::Succeeded => "succeeded",
            StepOutcome::Failed(_) => "failed",
            StepOutcome::Skipped => "skipped",
        }
    }
}

/// Order status as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order written and both reservation steps succeeded.
    Confirmed,
    /// Order written but at least one reservation step needs reconciliation.
    Pending,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Pending => "pending",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted order plus the fate of its reservation steps.
#[derive(Debug)]
pub struct OrderOutcome {
    pub order_id: OrderId,
    pub total: Money,
    pub reservation: StepOutcome<ReservationError>,
    pub notification: StepOutcome<NotificationError>,
}

impl OrderOutcome {
    pub fn status(&self) -> OrderStatus {
        if self.reservation.is_succeeded() && self.notification.is_succeeded() {
            OrderStatus::Confirmed
        } else {
            OrderStatus::Pending
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status() == OrderStatus::Confirmed
    }

    /// Names of the steps that did not succeed.
    pub fn pending_steps(&self) -> Vec<&'static str> {
        let mut steps = Vec::new();
        if !self.reservation.is_succeeded() {
            steps.push(STEP_RESERVE_ITEMS);
        }
        if !self.notification.is_succeeded() {
            steps.push(STEP_NOTIFY_RESERVED_ITEMS);
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn outcome(
        reservation: StepOutcome<ReservationError>,
        notification: StepOutcome<NotificationError>,
    ) -> OrderOutcome {
        OrderOutcome {
            order_id: OrderId::new(),
            total: Money::from_cents(2500),
            reservation,
            notification,
        }
    }

    #[test]
    fn test_all_steps_succeeded_is_confirmed() {
        let outcome = outcome(StepOutcome::Succeeded, StepOutcome::Succeeded);
        assert_eq!(outcome.status(), OrderStatus::Confirmed);
        assert!(outcome.pending_steps().is_empty());
    }

    #[test]
    fn test_failed_reservation_is_pending() {
        let outcome = outcome(
            StepOutcome::Failed(ReservationError::Timeout(Duration::from_secs(1))),
            StepOutcome::Succeeded,
        );
        assert_eq!(outcome.status(), OrderStatus::Pending);
        assert_eq!(outcome.pending_steps(), vec![STEP_RESERVE_ITEMS]);
        assert!(outcome.reservation.error().is_some());
    }

    #[test]
    fn test_skipped_steps_are_pending() {
        let outcome = outcome(StepOutcome::Succeeded, StepOutcome::Skipped);
        assert!(!outcome.is_confirmed());
        assert_eq!(outcome.pending_steps(), vec![STEP_NOTIFY_RESERVED_ITEMS]);
        assert_eq!(outcome.notification.as_str(), "skipped");
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            "\"pending\""
        );
    }
}
