use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use tiffin_core::OrderDraft;
use tiffin_db::{OrderStore, RepositoryError};

/// Tracking status written for every freshly placed order. Mutated later
/// by the fulfillment process, outside this service.
pub const INITIAL_TRACKING_STATUS: &str = "in progress";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("could not allocate the next order id: {0}")]
    Allocation(#[source] RepositoryError),
    #[error("could not insert line item `{item}`: {source}")]
    LineItemInsert {
        item: String,
        #[source]
        source: RepositoryError,
    },
    #[error("order {order_id} was placed but its tracking record failed: {source}")]
    TrackingInsert {
        order_id: i64,
        #[source]
        source: RepositoryError,
    },
}

/// Translates a completed in-memory order into the sequenced storage
/// calls: allocate an id, insert line items in draft order, record the
/// tracking status.
///
/// Line-item inserts are fail-fast with no cross-call rollback: the
/// storage surface is per-call, so an insert failure mid-sequence leaves
/// the earlier rows in place. Callers treat any failure as a lost order.
pub struct PersistenceGateway {
    store: Arc<dyn OrderStore>,
}

impl PersistenceGateway {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    pub async fn persist(&self, order: &OrderDraft) -> Result<i64, GatewayError> {
        let order_id =
            self.store.allocate_next_order_id().await.map_err(GatewayError::Allocation)?;

        for (item, quantity) in order.iter() {
            self.store
                .insert_order_item(item, quantity as i64, order_id)
                .await
                .map_err(|source| GatewayError::LineItemInsert { item: item.to_owned(), source })?;
        }

        self.store
            .insert_order_tracking(order_id, INITIAL_TRACKING_STATUS)
            .await
            .map_err(|source| GatewayError::TrackingInsert { order_id, source })?;

        info!(
            event_name = "order.persist.committed",
            order_id,
            line_items = order.len(),
            "order written to the storage backend"
        );
        Ok(order_id)
    }
}
