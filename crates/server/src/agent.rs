use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use tiffin_core::errors::OrderError;
use tiffin_core::{menu, OrderDraft, SessionId};
use tiffin_db::OrderStore;
use tiffin_dialog::OrderCommandService;

use crate::gateway::PersistenceGateway;
use crate::sessions::SessionManager;

/// The order aggregation state machine. Holds the session manager and
/// drives the persistence gateway on completion; every transition locks
/// its session for the full duration, so overlapping requests for one
/// session serialize while distinct sessions proceed independently.
pub struct OrderAgent {
    sessions: Arc<SessionManager>,
    gateway: PersistenceGateway,
    store: Arc<dyn OrderStore>,
}

impl OrderAgent {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self {
            sessions: Arc::new(SessionManager::new()),
            gateway: PersistenceGateway::new(store.clone()),
            store,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }
}

#[async_trait]
impl OrderCommandService for OrderAgent {
    /// Unconditionally discards any in-progress order for the session and
    /// answers with the menu. Idempotent; the next Add starts fresh.
    async fn start_order(&self, session: &SessionId) -> Result<String, OrderError> {
        let mut guard = self.sessions.lock(session).await;
        *guard = None;
        self.sessions.discard(session, &guard).await;
        drop(guard);

        info!(
            event_name = "order.start",
            session_id = %session,
            "new order requested, previous in-progress order discarded"
        );
        Ok(menu::start_order_message())
    }

    /// Pairs items with quantities and merges them into the session's
    /// draft, last write wins per item. A length mismatch fails before any
    /// state is touched.
    async fn add_items(
        &self,
        session: &SessionId,
        items: &[String],
        quantities: &[f64],
    ) -> Result<String, OrderError> {
        let incoming = OrderDraft::paired(items, quantities)?;

        let mut guard = self.sessions.lock(session).await;
        let draft = guard.get_or_insert_with(OrderDraft::new);
        draft.merge(incoming);
        let summary = draft.summary();
        let item_count = draft.len();
        drop(guard);

        info!(
            event_name = "order.add.merged",
            session_id = %session,
            item_count,
            "items merged into in-progress order"
        );
        Ok(format!("So far you have: {summary}. Do you need anything else?"))
    }

    /// Deletes the named items where present and reports the rest as
    /// absent. An order emptied this way stays in the session store.
    async fn remove_items(
        &self,
        session: &SessionId,
        items: &[String],
    ) -> Result<String, OrderError> {
        let mut guard = self.sessions.lock(session).await;
        let Some(draft) = guard.as_mut() else {
            self.sessions.discard(session, &guard).await;
            return Err(OrderError::NoActiveOrder(session.clone()));
        };

        let outcome = draft.remove_items(items);

        let mut reply = String::new();
        if !outcome.removed.is_empty() {
            reply.push_str(&format!("Removed {} from your order! ", outcome.removed.join(", ")));
        }
        if !outcome.missing.is_empty() {
            reply.push_str(&format!(
                "Your current order does not contain {}. ",
                outcome.missing.join(", ")
            ));
        }
        if draft.is_empty() {
            reply.push_str("Your current order is empty.");
        } else {
            reply.push_str(&format!("So far you have: {}", draft.summary()));
        }
        drop(guard);

        info!(
            event_name = "order.remove.applied",
            session_id = %session,
            removed = outcome.removed.len(),
            missing = outcome.missing.len(),
            "removal request applied"
        );
        Ok(reply)
    }

    /// Hands the draft to the persistence gateway. The in-progress order
    /// is discarded after the attempt whether it succeeded or not; there
    /// is exactly one completion attempt per order.
    async fn complete_order(&self, session: &SessionId) -> Result<String, OrderError> {
        let mut guard = self.sessions.lock(session).await;
        let Some(draft) = guard.take() else {
            self.sessions.discard(session, &guard).await;
            return Err(OrderError::NoActiveOrder(session.clone()));
        };

        let persisted = self.gateway.persist(&draft).await;
        self.sessions.discard(session, &guard).await;
        drop(guard);

        let order_id = match persisted {
            Ok(order_id) => order_id,
            Err(error) => {
                warn!(
                    event_name = "order.complete.failed",
                    session_id = %session,
                    error = %error,
                    "completion attempt failed, order discarded"
                );
                return Err(OrderError::Backend(error.to_string()));
            }
        };

        info!(
            event_name = "order.complete.placed",
            session_id = %session,
            order_id,
            "order placed"
        );

        // Total is priced by the backend after the fact; a placed order
        // with an unavailable total still confirms.
        match self.store.get_total_order_price(order_id).await {
            Ok(total) => Ok(format!(
                "Awesome. We have placed your order. Here is your order ID: {order_id}. \
                 Your order total is {total} which you can pay at the time of delivery."
            )),
            Err(error) => {
                warn!(
                    event_name = "order.complete.total_unavailable",
                    order_id,
                    error = %error,
                    "order placed but total could not be fetched"
                );
                Ok(format!(
                    "Awesome. We have placed your order. Here is your order ID: {order_id}. \
                     We will confirm your order total at the time of delivery."
                ))
            }
        }
    }

    async fn track_order(&self, order_id: i64) -> Result<String, OrderError> {
        match self.store.get_order_status(order_id).await {
            Ok(Some(status)) => {
                Ok(format!("The order status for order id: {order_id} is {status}"))
            }
            Ok(None) => Ok(format!("No order found with order id: {order_id}")),
            Err(error) => Err(OrderError::Backend(error.to_string())),
        }
    }
}
