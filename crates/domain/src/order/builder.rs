//! Joins basket lines with catalog records into order item snapshots.

use std::collections::HashMap;

use common::CatalogItemId;

use super::{OrderError, OrderItem};
use crate::basket::Basket;
use crate::catalog::{CatalogItem, PictureUriComposer};

/// Builds the order item snapshots for a basket.
///
/// Every basket line must resolve to a catalog record; unresolved IDs are
/// collected and reported together so nothing is written for a partial basket.
/// Line order and duplicate lines are preserved.
pub fn build_order_items(
    basket: &Basket,
    catalog_items: &[CatalogItem],
    composer: &dyn PictureUriComposer,
) -> Result<Vec<OrderItem>, OrderError> {
    if basket.is_empty() {
        return Err(OrderError::NoItems);
    }

    let by_id: HashMap<CatalogItemId, &CatalogItem> =
        catalog_items.iter().map(|item| (item.id, item)).collect();

    let mut missing = Vec::new();
    let mut items = Vec::with_capacity(basket.items.len());

    for line in &basket.items {
        match by_id.get(&line.catalog_item_id) {
            Some(catalog_item) => items.push(OrderItem::new(
                catalog_item.id,
                catalog_item.name.clone(),
                composer.compose(&catalog_item.picture_uri),
                line.unit_price,
                line.quantity,
            )),
            None => {
                if !missing.contains(&line.catalog_item_id) {
                    missing.push(line.catalog_item_id);
                }
            }
        }
    }

    if !missing.is_empty() {
        return Err(OrderError::MissingCatalogItems { ids: missing });
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basket::BasketItem;
    use crate::catalog::CatalogUriComposer;
    use crate::value_objects::Money;

    fn composer() -> CatalogUriComposer {
        CatalogUriComposer::new("https://cdn.example.com")
    }

    fn catalog() -> Vec<CatalogItem> {
        vec![
            CatalogItem::new(1, "Mug", "http://catalogbaseurltobereplaced/images/1.png"),
            CatalogItem::new(2, "Shirt", "http://catalogbaseurltobereplaced/images/2.png"),
        ]
    }

    #[test]
    fn test_snapshots_join_basket_and_catalog() {
        let basket = Basket::new(1, "buyer")
            .with_item(BasketItem::new(1, Money::from_dollars(10), 2))
            .with_item(BasketItem::new(2, Money::from_dollars(5), 1));

        let items = build_order_items(&basket, &catalog(), &composer()).unwrap();

        assert_eq!(
            items,
            vec![
                OrderItem::new(
                    1,
                    "Mug",
                    "https://cdn.example.com/images/1.png",
                    Money::from_dollars(10),
                    2
                ),
                OrderItem::new(
                    2,
                    "Shirt",
                    "https://cdn.example.com/images/2.png",
                    Money::from_dollars(5),
                    1
                ),
            ]
        );
    }

    #[test]
    fn test_price_comes_from_basket_not_catalog() {
        let basket =
            Basket::new(1, "buyer").with_item(BasketItem::new(1, Money::from_cents(777), 1));

        let items = build_order_items(&basket, &catalog(), &composer()).unwrap();
        assert_eq!(items[0].unit_price, Money::from_cents(777));
    }

    #[test]
    fn test_missing_items_reported_together() {
        let basket = Basket::new(1, "buyer")
            .with_item(BasketItem::new(1, Money::from_dollars(10), 1))
            .with_item(BasketItem::new(40, Money::from_dollars(1), 1))
            .with_item(BasketItem::new(41, Money::from_dollars(1), 1))
            .with_item(BasketItem::new(40, Money::from_dollars(1), 3));

        let err = build_order_items(&basket, &catalog(), &composer()).unwrap_err();
        assert_eq!(
            err,
            OrderError::MissingCatalogItems {
                ids: vec![CatalogItemId::new(40), CatalogItemId::new(41)]
            }
        );
        assert_eq!(err.to_string(), "Catalog items not found: 40, 41");
    }

    #[test]
    fn test_empty_basket_rejected() {
        let basket = Basket::new(1, "buyer");
        let err = build_order_items(&basket, &catalog(), &composer()).unwrap_err();
        assert_eq!(err, OrderError::NoItems);
    }
}
