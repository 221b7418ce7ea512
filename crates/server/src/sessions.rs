use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use tiffin_core::{OrderDraft, SessionId};

type Slot = Arc<Mutex<Option<OrderDraft>>>;

/// Exclusive access to one session's draft for the duration of one
/// transition. `None` means the session has no active order. The guard
/// remembers which slot it locked so discards can be identity-checked.
pub struct SessionGuard {
    slot: Slot,
    guard: OwnedMutexGuard<Option<OrderDraft>>,
}

impl Deref for SessionGuard {
    type Target = Option<OrderDraft>;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

/// Process-wide keyed store of in-progress orders with an explicit
/// lifecycle: a slot is created lazily on first lock, cleared or removed
/// only by the transitions that own it, and never garbage-collected
/// implicitly.
///
/// Per-session mutation is serialized by the slot mutex, which callers
/// hold across a whole transition (persistence call included) so two
/// overlapping Complete requests cannot both observe the draft. The outer
/// map lock is held only long enough to clone or compare a slot handle,
/// so distinct sessions never contend.
#[derive(Default)]
pub struct SessionManager {
    slots: Mutex<HashMap<SessionId, Slot>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, session: &SessionId) -> SessionGuard {
        loop {
            let slot = {
                let mut slots = self.slots.lock().await;
                slots.entry(session.clone()).or_default().clone()
            };
            let guard = slot.clone().lock_owned().await;

            // The entry may have been discarded while this task waited on
            // the slot mutex. A guard over an orphaned slot must not be
            // handed out: mutations through it would be invisible to every
            // later lookup. Retry against whatever the map holds now.
            let slots = self.slots.lock().await;
            if slots.get(session).is_some_and(|current| Arc::ptr_eq(current, &slot)) {
                return SessionGuard { slot, guard };
            }
        }
    }

    /// Removes the session's entry, but only while it still refers to the
    /// slot the caller holds. A handle kept past its own discard must not
    /// delete a slot a newer request has since created.
    pub async fn discard(&self, session: &SessionId, held: &SessionGuard) {
        let mut slots = self.slots.lock().await;
        if slots.get(session).is_some_and(|current| Arc::ptr_eq(current, &held.slot)) {
            slots.remove(session);
        }
    }

    pub async fn contains(&self, session: &SessionId) -> bool {
        self.slots.lock().await.contains_key(session)
    }

    pub async fn session_count(&self) -> usize {
        self.slots.lock().await.len()
    }
}
