//! Reservation payloads derived from a persisted order.

use common::{CatalogItemId, OrderId};
use serde::{Deserialize, Serialize, Serializer};

use crate::value_objects::{Address, Money, decimal};

/// One `{itemId, quantity}` pair on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationLine {
    pub item_id: CatalogItemId,
    pub quantity: u32,
}

/// Body of the synchronous reservation call.
///
/// Serializes as `{ shipToAddress, finalPrice, orderItems: [{itemId, quantity}] }`.
/// The order ID is not part of the body; clients send it as an idempotency key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    #[serde(skip)]
    pub order_id: OrderId,
    pub ship_to_address: Address,
    #[serde(serialize_with = "decimal::serialize")]
    pub final_price: Money,
    pub order_items: Vec<ReservationLine>,
}

/// "Reserve items" message for the asynchronous reservation pipeline.
///
/// Serializes as a bare JSON array of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationNotification {
    order_id: OrderId,
    lines: Vec<ReservationLine>,
}

impl ReservationNotification {
    pub fn new(order_id: OrderId, lines: Vec<ReservationLine>) -> Self {
        Self { order_id, lines }
    }

    /// Order this message was derived from; used as the message ID.
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn lines(&self) -> &[ReservationLine] {
        &self.lines
    }
}

impl Serialize for ReservationNotification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.lines.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines() -> Vec<ReservationLine> {
        vec![
            ReservationLine {
                item_id: CatalogItemId::new(1),
                quantity: 2,
            },
            ReservationLine {
                item_id: CatalogItemId::new(2),
                quantity: 1,
            },
        ]
    }

    #[test]
    fn test_request_wire_shape() {
        let request = ReservationRequest {
            order_id: OrderId::new(),
            ship_to_address: Address::new("1 Main St", "Redmond", "WA", "US", "98052").unwrap(),
            final_price: Money::from_dollars(25),
            order_items: lines(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "shipToAddress": {
                    "street": "1 Main St",
                    "city": "Redmond",
                    "state": "WA",
                    "country": "US",
                    "zipCode": "98052"
                },
                "finalPrice": 25.0,
                "orderItems": [
                    { "itemId": 1, "quantity": 2 },
                    { "itemId": 2, "quantity": 1 }
                ]
            })
        );
    }

    #[test]
    fn test_notification_is_bare_array() {
        let notification = ReservationNotification::new(OrderId::new(), lines());
        let json = serde_json::to_string(&notification).unwrap();
        assert_eq!(
            json,
            r#"[{"itemId":1,"quantity":2},{"itemId":2,"quantity":1}]"#
        );
    }
}
