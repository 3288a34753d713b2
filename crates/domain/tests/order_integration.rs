//! Integration tests for order building.
//!
//! These tests exercise the full path from a basket and catalog snapshot to a
//! persisted-shape order and its reservation payloads.

use common::{BuyerId, CatalogItemId, OrderId};
use domain::{
    Address, Basket, BasketItem, CatalogItem, CatalogUriComposer, Money, NewOrder, OrderError,
    build_order_items,
};
use proptest::prelude::*;

fn address() -> Address {
    Address::new("15703 NE 61st Ct", "Redmond", "WA", "United States", "98052").unwrap()
}

fn composer() -> CatalogUriComposer {
    CatalogUriComposer::new("https://catalog.example.com")
}

mod order_building {
    use super::*;

    #[test]
    fn two_line_basket_totals_twenty_five_dollars() {
        let basket = Basket::new(1, "demouser@example.com")
            .with_item(BasketItem::new(10, Money::from_dollars(10), 2))
            .with_item(BasketItem::new(11, Money::from_dollars(5), 1));
        let catalog = vec![
            CatalogItem::new(10, "A", "http://catalogbaseurltobereplaced/images/10.png"),
            CatalogItem::new(11, "B", "http://catalogbaseurltobereplaced/images/11.png"),
        ];

        let items = build_order_items(&basket, &catalog, &composer()).unwrap();
        let order = NewOrder::new(basket.buyer_id.clone(), address(), items).unwrap();

        assert_eq!(order.total(), Money::from_dollars(25));
        let lines: Vec<_> = order
            .items()
            .iter()
            .map(|i| (i.item_id.as_i64(), i.quantity, i.unit_price))
            .collect();
        assert_eq!(
            lines,
            vec![(10, 2, Money::from_dollars(10)), (11, 1, Money::from_dollars(5))]
        );
    }

    #[test]
    fn catalog_changes_do_not_alter_built_items() {
        let basket =
            Basket::new(1, "buyer").with_item(BasketItem::new(10, Money::from_dollars(3), 1));
        let mut catalog = vec![CatalogItem::new(10, "Old name", "/old.png")];

        let items = build_order_items(&basket, &catalog, &composer()).unwrap();
        catalog[0].name = "New name".to_string();

        assert_eq!(items[0].name, "Old name");
        assert_eq!(items[0].picture_uri, "/old.png");
    }

    #[test]
    fn missing_catalog_item_blocks_order() {
        let basket =
            Basket::new(1, "buyer").with_item(BasketItem::new(99, Money::from_dollars(3), 1));

        let result = build_order_items(&basket, &[], &composer());

        assert_eq!(
            result.unwrap_err(),
            OrderError::MissingCatalogItems {
                ids: vec![CatalogItemId::new(99)]
            }
        );
    }

    #[test]
    fn persisted_order_produces_matching_payloads() {
        let basket = Basket::new(1, "buyer")
            .with_item(BasketItem::new(10, Money::from_cents(1999), 3))
            .with_item(BasketItem::new(11, Money::from_cents(1), 1));
        let catalog = vec![
            CatalogItem::new(10, "A", "/a.png"),
            CatalogItem::new(11, "B", "/b.png"),
        ];
        let items = build_order_items(&basket, &catalog, &composer()).unwrap();
        let order = NewOrder::new(BuyerId::new("buyer"), address(), items)
            .unwrap()
            .into_order(OrderId::new());

        let body = serde_json::to_value(order.reservation_request()).unwrap();
        assert_eq!(body["finalPrice"], serde_json::json!(59.98));
        assert_eq!(body["orderItems"][0]["itemId"], 10);
        assert_eq!(body["orderItems"][0]["quantity"], 3);

        let message = serde_json::to_value(order.reservation_notification()).unwrap();
        assert_eq!(message, serde_json::json!([
            { "itemId": 10, "quantity": 3 },
            { "itemId": 11, "quantity": 1 }
        ]));
    }
}

mod totals {
    use super::*;

    fn basket_lines() -> impl Strategy<Value = Vec<(i64, i64, u32)>> {
        prop::collection::vec((1i64..50, 0i64..100_000, 1u32..20), 1..12)
    }

    proptest! {
        #[test]
        fn order_total_equals_sum_of_basket_lines(lines in basket_lines()) {
            let mut basket = Basket::new(1, "buyer");
            let mut catalog = Vec::new();
            for (id, price, quantity) in &lines {
                basket = basket.with_item(BasketItem::new(*id, Money::from_cents(*price), *quantity));
                if !catalog.iter().any(|c: &CatalogItem| c.id.as_i64() == *id) {
                    catalog.push(CatalogItem::new(*id, format!("item-{id}"), "/p.png"));
                }
            }

            let items = build_order_items(&basket, &catalog, &composer()).unwrap();
            let order = NewOrder::new(basket.buyer_id.clone(), address(), items).unwrap();

            let expected: i64 = lines.iter().map(|(_, price, qty)| price * i64::from(*qty)).sum();
            prop_assert_eq!(order.total().cents(), expected);
            prop_assert_eq!(order.items().len(), lines.len());
        }
    }
}
