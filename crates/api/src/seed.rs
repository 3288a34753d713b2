//! Demo data for running against the in-memory store.

use domain::{Basket, BasketItem, CatalogItem, CatalogUriComposer, Money};
use order_store::InMemoryStore;

/// Basket seeded by [`seed_demo_data`].
pub const DEMO_BASKET_ID: i64 = 1;

/// Buyer owning the demo basket.
pub const DEMO_BUYER_ID: &str = "demouser@example.com";

/// Seeds a small catalog and one basket referencing it.
pub async fn seed_demo_data(store: &InMemoryStore) {
    let catalog = [
        (1, ".NET Bot Black Sweatshirt", "images/products/1.png"),
        (2, ".NET Black & White Mug", "images/products/2.png"),
        (3, "Prism White T-Shirt", "images/products/3.png"),
    ];
    for (id, name, picture) in catalog {
        let picture_uri = format!("{}/{}", CatalogUriComposer::PLACEHOLDER_BASE, picture);
        store
            .insert_catalog_item(CatalogItem::new(id, name, picture_uri))
            .await;
    }

    store
        .insert_basket(
            Basket::new(DEMO_BASKET_ID, DEMO_BUYER_ID)
                .with_item(BasketItem::new(1, Money::from_cents(1950), 2))
                .with_item(BasketItem::new(2, Money::from_cents(850), 1)),
        )
        .await;

    tracing::info!(basket_id = DEMO_BASKET_ID, "seeded demo catalog and basket");
}
