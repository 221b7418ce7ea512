use async_trait::async_trait;
use rust_decimal::Decimal;

use super::{OrderStore, RepositoryError};
use crate::DbPool;

pub struct SqlOrderStore {
    pool: DbPool,
}

impl SqlOrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for SqlOrderStore {
    async fn allocate_next_order_id(&self) -> Result<i64, RepositoryError> {
        let max_id = sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(order_id) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(max_id.map_or(1, |id| id + 1))
    }

    async fn insert_order_item(
        &self,
        item: &str,
        quantity: i64,
        order_id: i64,
    ) -> Result<(), RepositoryError> {
        let menu_row = sqlx::query_as::<_, (i64, i64)>(
            "SELECT item_id, price_cents FROM food_items WHERE name = ?1 COLLATE NOCASE",
        )
        .bind(item)
        .fetch_optional(&self.pool)
        .await?;

        let Some((item_id, price_cents)) = menu_row else {
            return Err(RepositoryError::UnknownFoodItem(item.to_owned()));
        };

        sqlx::query(
            "INSERT INTO orders (order_id, item_id, quantity, total_price_cents) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(order_id)
        .bind(item_id)
        .bind(quantity)
        .bind(price_cents * quantity)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_order_tracking(
        &self,
        order_id: i64,
        status: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO order_tracking (order_id, status) VALUES (?1, ?2)")
            .bind(order_id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_order_status(&self, order_id: i64) -> Result<Option<String>, RepositoryError> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM order_tracking WHERE order_id = ?1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(status)
    }

    async fn get_total_order_price(&self, order_id: i64) -> Result<Decimal, RepositoryError> {
        let total_cents = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(total_price_cents), 0) FROM orders WHERE order_id = ?1",
        )
        .bind(order_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Decimal::new(total_cents, 2))
    }
}
