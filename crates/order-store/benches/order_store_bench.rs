use common::{BasketId, BuyerId, CatalogItemId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Address, Basket, BasketItem, CatalogItem, Money, NewOrder, OrderItem};
use order_store::{BasketReader, CatalogReader, InMemoryStore, OrderStore};

fn new_order() -> NewOrder {
    NewOrder::new(
        BuyerId::new("bench-buyer"),
        Address::new("1 Bench Way", "Redmond", "WA", "US", "98052").unwrap(),
        (1..=10)
            .map(|id| OrderItem::new(id, format!("Item {id}"), "/p.png", Money::from_cents(999), 1))
            .collect(),
    )
    .unwrap()
}

fn bench_add_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let order = new_order();

    c.bench_function("order_store/memory_add_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryStore::new();
                store.add(&order).await.unwrap();
            });
        });
    });
}

fn bench_basket_and_catalog_reads(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let ids: Vec<CatalogItemId> = (1..=10).map(CatalogItemId::new).collect();

    rt.block_on(async {
        let mut basket = Basket::new(1, "bench-buyer");
        for id in &ids {
            basket = basket.with_item(BasketItem::new(*id, Money::from_cents(999), 1));
            store
                .insert_catalog_item(CatalogItem::new(*id, "Item", "/p.png"))
                .await;
        }
        store.insert_basket(basket).await;
    });

    c.bench_function("order_store/memory_basket_and_catalog_read", |b| {
        b.iter(|| {
            rt.block_on(async {
                let basket = store
                    .find_basket_with_items(BasketId::new(1))
                    .await
                    .unwrap()
                    .unwrap();
                store
                    .find_catalog_items(&basket.catalog_item_ids())
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_add_order, bench_basket_and_catalog_reads);
criterion_main!(benches);
