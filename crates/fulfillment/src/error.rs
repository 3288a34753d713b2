//! Fulfillment error types.

use common::{BasketId, CatalogItemId};
use order_store::StoreError;
use thiserror::Error;

use crate::state::FulfillmentStage;

/// The basket cannot be turned into an order. Raised before any write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Basket not found: {0}")]
    BasketNotFound(BasketId),

    #[error("Basket {0} has no items")]
    EmptyBasket(BasketId),

    /// Basket lines reference catalog items that do not exist.
    ///
    /// A data-consistency fault between the basket and catalog, not a user error.
    #[error("Basket {basket_id} references missing catalog items: {}", join_ids(.ids))]
    CatalogItemMissing {
        basket_id: BasketId,
        ids: Vec<CatalogItemId>,
    },

    #[error("Basket {basket_id} has a zero quantity for catalog item {item_id}")]
    InvalidQuantity {
        basket_id: BasketId,
        item_id: CatalogItemId,
    },

    #[error("Basket {0} total is too large")]
    TotalOverflow(BasketId),
}

fn join_ids(ids: &[CatalogItemId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors that abort order creation. No order exists when one of these is returned.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Reading the basket or catalog failed.
    #[error("Lookup failed: {0}")]
    Lookup(StoreError),

    /// Writing the order failed.
    #[error("Persisting order failed: {0}")]
    Persistence(StoreError),

    /// The overall deadline elapsed before the order was written.
    #[error("Deadline exceeded while {stage}")]
    DeadlineExceeded { stage: FulfillmentStage },
}

impl FulfillmentError {
    /// Short label used for the failure metric.
    pub fn reason(&self) -> &'static str {
        match self {
            FulfillmentError::Validation(ValidationError::BasketNotFound(_)) => "basket_not_found",
            FulfillmentError::Validation(ValidationError::EmptyBasket(_)) => "empty_basket",
            FulfillmentError::Validation(ValidationError::CatalogItemMissing { .. }) => {
                "catalog_item_missing"
            }
            FulfillmentError::Validation(ValidationError::InvalidQuantity { .. }) => {
                "invalid_quantity"
            }
            FulfillmentError::Validation(ValidationError::TotalOverflow(_)) => "total_overflow",
            FulfillmentError::Lookup(_) => "lookup",
            FulfillmentError::Persistence(_) => "persistence",
            FulfillmentError::DeadlineExceeded { .. } => "deadline_exceeded",
        }
    }

    /// True when the same request may succeed later without any change.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FulfillmentError::Lookup(_)
                | FulfillmentError::Persistence(_)
                | FulfillmentError::DeadlineExceeded { .. }
        )
    }
}

/// Convenience type alias for fulfillment results.
pub type Result<T> = std::result::Result<T, FulfillmentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_items_message_lists_ids() {
        let err = ValidationError::CatalogItemMissing {
            basket_id: BasketId::new(3),
            ids: vec![CatalogItemId::new(40), CatalogItemId::new(41)],
        };
        assert_eq!(
            err.to_string(),
            "Basket 3 references missing catalog items: 40, 41"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(
            !FulfillmentError::from(ValidationError::EmptyBasket(BasketId::new(1))).is_retryable()
        );
        assert!(
            FulfillmentError::Persistence(StoreError::Unavailable("down".into())).is_retryable()
        );
        assert!(
            FulfillmentError::DeadlineExceeded {
                stage: FulfillmentStage::Validating
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_reason_labels() {
        assert_eq!(
            FulfillmentError::from(ValidationError::BasketNotFound(BasketId::new(1))).reason(),
            "basket_not_found"
        );
        assert_eq!(
            FulfillmentError::Lookup(StoreError::Unavailable("down".into())).reason(),
            "lookup"
        );
        assert_eq!(
            FulfillmentError::from(ValidationError::TotalOverflow(BasketId::new(1))).reason(),
            "total_overflow"
        );
    }
}
