use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use tiffin_core::menu;

use super::{OrderStore, RepositoryError};

/// One line item as the store persisted it.
#[derive(Clone, Debug, PartialEq)]
pub struct PersistedLineItem {
    pub order_id: i64,
    pub item: String,
    pub quantity: i64,
    pub total_price: Decimal,
}

/// Per-operation call counters, for asserting how often a transition
/// touched the storage collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreCallCounts {
    pub allocate: u32,
    pub insert_item: u32,
    pub insert_tracking: u32,
    pub status: u32,
    pub total: u32,
}

impl StoreCallCounts {
    pub fn grand_total(&self) -> u32 {
        self.allocate + self.insert_item + self.insert_tracking + self.status + self.total
    }
}

#[derive(Default)]
struct MemoryState {
    seeded_ids: Vec<i64>,
    line_items: Vec<PersistedLineItem>,
    tracking: HashMap<i64, String>,
    calls: StoreCallCounts,
    fail_item: Option<String>,
    fail_allocation: bool,
    fail_tracking: bool,
}

/// In-memory [`OrderStore`] fake. Prices come from the core menu, so it
/// behaves like a freshly migrated SQL store; failures can be injected per
/// operation.
#[derive(Default)]
pub struct InMemoryOrderStore {
    state: Mutex<MemoryState>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend these order ids already exist, without line items.
    pub async fn seed_order_ids(&self, ids: &[i64]) {
        self.state.lock().await.seeded_ids.extend_from_slice(ids);
    }

    /// Every subsequent insert of `item` fails.
    pub async fn fail_inserts_for(&self, item: &str) {
        self.state.lock().await.fail_item = Some(item.to_owned());
    }

    pub async fn fail_allocation(&self) {
        self.state.lock().await.fail_allocation = true;
    }

    pub async fn fail_tracking(&self) {
        self.state.lock().await.fail_tracking = true;
    }

    pub async fn line_items(&self) -> Vec<PersistedLineItem> {
        self.state.lock().await.line_items.clone()
    }

    pub async fn tracking_status(&self, order_id: i64) -> Option<String> {
        self.state.lock().await.tracking.get(&order_id).cloned()
    }

    pub async fn set_tracking_status(&self, order_id: i64, status: &str) {
        self.state.lock().await.tracking.insert(order_id, status.to_owned());
    }

    pub async fn calls(&self) -> StoreCallCounts {
        self.state.lock().await.calls
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn allocate_next_order_id(&self) -> Result<i64, RepositoryError> {
        let mut state = self.state.lock().await;
        state.calls.allocate += 1;

        if state.fail_allocation {
            return Err(RepositoryError::Unavailable("allocation failure injected".to_owned()));
        }

        let max_id = state
            .seeded_ids
            .iter()
            .copied()
            .chain(state.line_items.iter().map(|line| line.order_id))
            .max();
        Ok(max_id.map_or(1, |id| id + 1))
    }

    async fn insert_order_item(
        &self,
        item: &str,
        quantity: i64,
        order_id: i64,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.calls.insert_item += 1;

        if state.fail_item.as_deref() == Some(item) {
            return Err(RepositoryError::Unavailable(format!(
                "insert failure injected for `{item}`"
            )));
        }

        let price = menu::list_price(item)
            .ok_or_else(|| RepositoryError::UnknownFoodItem(item.to_owned()))?;

        state.line_items.push(PersistedLineItem {
            order_id,
            item: item.to_owned(),
            quantity,
            total_price: price * Decimal::from(quantity),
        });
        Ok(())
    }

    async fn insert_order_tracking(
        &self,
        order_id: i64,
        status: &str,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.calls.insert_tracking += 1;

        if state.fail_tracking {
            return Err(RepositoryError::Unavailable("tracking failure injected".to_owned()));
        }

        state.tracking.insert(order_id, status.to_owned());
        Ok(())
    }

    async fn get_order_status(&self, order_id: i64) -> Result<Option<String>, RepositoryError> {
        let mut state = self.state.lock().await;
        state.calls.status += 1;
        Ok(state.tracking.get(&order_id).cloned())
    }

    async fn get_total_order_price(&self, order_id: i64) -> Result<Decimal, RepositoryError> {
        let mut state = self.state.lock().await;
        state.calls.total += 1;
        Ok(state
            .line_items
            .iter()
            .filter(|line| line.order_id == order_id)
            .map(|line| line.total_price)
            .sum())
    }
}
