use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BasketId, BuyerId, CatalogItemId, OrderId};
use domain::{Address, Basket, BasketItem, CatalogItem, Money, NewOrder, Order, OrderItem};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{BasketReader, CatalogReader, OrderStore, Result, StoreError};

/// PostgreSQL-backed store implementing every collaborator trait.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Writes a basket and its items, replacing any existing basket with the same ID.
    ///
    /// Baskets belong to the basket subsystem; this exists for seeding and tests.
    pub async fn insert_basket(&self, basket: &Basket) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM baskets WHERE id = $1")
            .bind(basket.id.as_i64())
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO baskets (id, buyer_id) VALUES ($1, $2)")
            .bind(basket.id.as_i64())
            .bind(basket.buyer_id.as_str())
            .execute(&mut *tx)
            .await?;

        for item in &basket.items {
            sqlx::query(
                r#"
                INSERT INTO basket_items (basket_id, catalog_item_id, unit_price_cents, quantity)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(basket.id.as_i64())
            .bind(item.catalog_item_id.as_i64())
            .bind(item.unit_price.cents())
            .bind(to_db_quantity(item.quantity)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Writes or updates a catalog record. Exists for seeding and tests.
    pub async fn upsert_catalog_item(&self, item: &CatalogItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO catalog_items (id, name, picture_uri)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, picture_uri = EXCLUDED.picture_uri
            "#,
        )
        .bind(item.id.as_i64())
        .bind(&item.name)
        .bind(&item.picture_uri)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn row_to_order_item(row: &PgRow) -> Result<OrderItem> {
        Ok(OrderItem::new(
            CatalogItemId::new(row.try_get("catalog_item_id")?),
            row.try_get::<String, _>("product_name")?,
            row.try_get::<String, _>("picture_uri")?,
            Money::from_cents(row.try_get("unit_price_cents")?),
            from_db_quantity(row.try_get("quantity")?)?,
        ))
    }
}

fn to_db_quantity(quantity: u32) -> Result<i32> {
    i32::try_from(quantity)
        .map_err(|_| StoreError::Corrupt(format!("quantity {quantity} exceeds column range")))
}

fn from_db_quantity(quantity: i32) -> Result<u32> {
    u32::try_from(quantity)
        .map_err(|_| StoreError::Corrupt(format!("negative quantity {quantity}")))
}

#[async_trait]
impl BasketReader for PostgresStore {
    async fn find_basket_with_items(&self, basket_id: BasketId) -> Result<Option<Basket>> {
        let Some(row) = sqlx::query("SELECT id, buyer_id FROM baskets WHERE id = $1")
            .bind(basket_id.as_i64())
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut basket = Basket::new(basket_id, row.try_get::<String, _>("buyer_id")?);

        let rows = sqlx::query(
            r#"
            SELECT catalog_item_id, unit_price_cents, quantity
            FROM basket_items
            WHERE basket_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(basket_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            basket.items.push(BasketItem::new(
                CatalogItemId::new(row.try_get("catalog_item_id")?),
                Money::from_cents(row.try_get("unit_price_cents")?),
                from_db_quantity(row.try_get("quantity")?)?,
            ));
        }

        Ok(Some(basket))
    }
}

#[async_trait]
impl CatalogReader for PostgresStore {
    async fn find_catalog_items(&self, ids: &[CatalogItemId]) -> Result<Vec<CatalogItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw_ids: Vec<i64> = ids.iter().map(CatalogItemId::as_i64).collect();
        let rows = sqlx::query("SELECT id, name, picture_uri FROM catalog_items WHERE id = ANY($1)")
            .bind(raw_ids)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| -> Result<CatalogItem> {
                Ok(CatalogItem::new(
                    CatalogItemId::new(row.try_get("id")?),
                    row.try_get::<String, _>("name")?,
                    row.try_get::<String, _>("picture_uri")?,
                ))
            })
            .collect()
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn add(&self, order: &NewOrder) -> Result<OrderId> {
        let order_id = OrderId::new();
        let ship_to = order.ship_to();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, buyer_id, order_date, ship_to_street, ship_to_city,
                                ship_to_state, ship_to_country, ship_to_zip_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(order.buyer_id().as_str())
        .bind(order.order_date())
        .bind(&ship_to.street)
        .bind(&ship_to.city)
        .bind(&ship_to.state)
        .bind(&ship_to.country)
        .bind(&ship_to.zip_code)
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items().iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| StoreError::Corrupt("too many order items".to_string()))?;

            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, catalog_item_id, product_name,
                                         picture_uri, unit_price_cents, quantity)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(order_id.as_uuid())
            .bind(position)
            .bind(item.item_id.as_i64())
            .bind(&item.name)
            .bind(&item.picture_uri)
            .bind(item.unit_price.cents())
            .bind(to_db_quantity(item.quantity)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        metrics::counter!("order_store_orders_written_total").increment(1);
        tracing::debug!(%order_id, items = order.items().len(), "order written");

        Ok(order_id)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let Some(row) = sqlx::query(
            r#"
            SELECT id, buyer_id, order_date, ship_to_street, ship_to_city,
                   ship_to_state, ship_to_country, ship_to_zip_code
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        // Stored addresses were validated on the way in.
        let ship_to = Address {
            street: row.try_get("ship_to_street")?,
            city: row.try_get("ship_to_city")?,
            state: row.try_get("ship_to_state")?,
            country: row.try_get("ship_to_country")?,
            zip_code: row.try_get("ship_to_zip_code")?,
        };
        let buyer_id = BuyerId::new(row.try_get::<String, _>("buyer_id")?);
        let order_date: DateTime<Utc> = row.try_get("order_date")?;
        let id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);

        let item_rows = sqlx::query(
            r#"
            SELECT catalog_item_id, product_name, picture_uri, unit_price_cents, quantity
            FROM order_items
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let items = item_rows
            .iter()
            .map(Self::row_to_order_item)
            .collect::<Result<Vec<_>>>()?;

        let order = Order::restore(id, buyer_id, ship_to, items, order_date)
            .map_err(|e| StoreError::Corrupt(format!("order {id}: {e}")))?;
        Ok(Some(order))
    }
}
