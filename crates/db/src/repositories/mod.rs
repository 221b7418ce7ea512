use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

pub mod memory;
pub mod order;

pub use memory::{InMemoryOrderStore, PersistedLineItem, StoreCallCounts};
pub use order::SqlOrderStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("unknown food item `{0}`")]
    UnknownFoodItem(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// The storage collaborator surface for placed orders. Each call is an
/// independent operation: there is no cross-call transaction, so callers
/// sequencing several calls own their own failure policy.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Next free order id: `max(order_id) + 1`, or `1` when no orders
    /// exist yet. Ids are never reused.
    async fn allocate_next_order_id(&self) -> Result<i64, RepositoryError>;

    /// Writes one line item, pricing it from the menu table. The item name
    /// must match a known menu entry.
    async fn insert_order_item(
        &self,
        item: &str,
        quantity: i64,
        order_id: i64,
    ) -> Result<(), RepositoryError>;

    async fn insert_order_tracking(
        &self,
        order_id: i64,
        status: &str,
    ) -> Result<(), RepositoryError>;

    async fn get_order_status(&self, order_id: i64) -> Result<Option<String>, RepositoryError>;

    /// Total price across the order's line items. Zero for an order id with
    /// no rows; failures are explicit, never a sentinel value.
    async fn get_total_order_price(&self, order_id: i64) -> Result<Decimal, RepositoryError>;
}
