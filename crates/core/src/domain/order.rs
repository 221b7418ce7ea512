use indexmap::IndexMap;

use crate::errors::OrderError;

/// The accumulating item -> quantity mapping for one session, prior to
/// completion. Insertion order is preserved: it drives both the summary
/// text and the iteration order at persistence time.
///
/// Quantities are held as numbers exactly as the NLU platform delivers
/// them (they may arrive as floating text such as `2.0`) and are coerced
/// to integers only when persisted or displayed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderDraft {
    items: IndexMap<String, f64>,
}

/// Outcome of a removal request: which items were actually deleted and
/// which were never part of the order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Removal {
    pub removed: Vec<String>,
    pub missing: Vec<String>,
}

impl OrderDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs `items[i]` with `quantities[i]`. The pairing is order-sensitive:
    /// if an item repeats within the same call, the later pairing silently
    /// overwrites the earlier one. Mismatched lengths fail without producing
    /// a draft.
    pub fn paired(items: &[String], quantities: &[f64]) -> Result<Self, OrderError> {
        if items.len() != quantities.len() {
            return Err(OrderError::MismatchedQuantities {
                items: items.len(),
                quantities: quantities.len(),
            });
        }

        let mut draft = Self::new();
        for (item, quantity) in items.iter().zip(quantities) {
            draft.items.insert(item.clone(), *quantity);
        }
        Ok(draft)
    }

    /// Merges `incoming` into this draft with last-write-wins per key: new
    /// quantities replace old ones for the same item, items not mentioned
    /// are untouched. Repeated additions overwrite, they never sum.
    pub fn merge(&mut self, incoming: OrderDraft) {
        for (item, quantity) in incoming.items {
            self.items.insert(item, quantity);
        }
    }

    /// Partitions `requested` into items that were present (and are now
    /// deleted) and items the order never contained. Removing everything
    /// leaves an empty draft; the draft itself is never discarded here.
    pub fn remove_items(&mut self, requested: &[String]) -> Removal {
        let mut outcome = Removal::default();
        for item in requested {
            if self.items.shift_remove(item).is_some() {
                outcome.removed.push(item.clone());
            } else {
                outcome.missing.push(item.clone());
            }
        }
        outcome
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn quantity_of(&self, item: &str) -> Option<f64> {
        self.items.get(item).copied()
    }

    /// Line items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.items.iter().map(|(item, quantity)| (item.as_str(), *quantity))
    }

    /// Human-readable summary, e.g. `2 Pizza, 1 Samosa`. Quantities are
    /// shown as whole numbers.
    pub fn summary(&self) -> String {
        self.items
            .iter()
            .map(|(item, quantity)| format!("{} {item}", *quantity as i64))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
