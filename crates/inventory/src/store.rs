//! The item collection and every operation that touches it.

use stockdash_core::{DomainError, DomainResult, ItemId};

use crate::item::{Item, ItemFields, ItemStatus};
use crate::summary::InventorySummary;

/// Owns the item collection.
///
/// Items keep insertion order; `update` replaces in place, so an edited item
/// does not move. Mutations take `&mut self` and complete in one step, so
/// readers never observe an item whose `status` disagrees with its `stock`.
#[derive(Debug, Clone, Default)]
pub struct InventoryStore {
    items: Vec<Item>,
}

impl InventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store by adding each entry in order (ids start at 1).
    pub fn with_items<I, F>(fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<ItemFields>,
    {
        let mut store = Self::new();
        for f in fields {
            store.add(f);
        }
        store
    }

    /// Id the next `add` will assign: `1 + max(existing)`, or 1 when empty.
    pub fn next_id(&self) -> ItemId {
        self.items
            .iter()
            .map(Item::id_typed)
            .max()
            .map_or(ItemId::new(1), ItemId::next)
    }

    pub fn add(&mut self, fields: impl Into<ItemFields>) -> Item {
        let item = Item::from_fields(self.next_id(), fields.into());
        tracing::debug!(item_id = %item.id_typed(), status = %item.status(), "item added");
        self.items.push(item.clone());
        item
    }

    /// Replace every mutable field of an existing item.
    ///
    /// Unlike [`remove`](Self::remove), a missing id is an error.
    pub fn update(&mut self, id: ItemId, fields: impl Into<ItemFields>) -> DomainResult<Item> {
        let slot = self
            .items
            .iter_mut()
            .find(|item| item.id_typed() == id)
            .ok_or_else(|| DomainError::not_found(format!("item {id}")))?;

        *slot = Item::from_fields(id, fields.into());
        tracing::debug!(item_id = %id, status = %slot.status(), "item updated");
        Ok(slot.clone())
    }

    /// Remove an item. Absent ids are ignored.
    pub fn remove(&mut self, id: ItemId) {
        let before = self.items.len();
        self.items.retain(|item| item.id_typed() != id);
        if self.items.len() != before {
            tracing::debug!(item_id = %id, "item removed");
        }
    }

    pub fn clear(&mut self) {
        tracing::debug!(removed = self.items.len(), "inventory cleared");
        self.items.clear();
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id_typed() == id)
    }

    /// All items, in insertion order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items whose name or category contains `query`, ignoring case.
    ///
    /// Order follows insertion order; an empty query returns everything.
    pub fn search(&self, query: &str) -> Vec<&Item> {
        let needle = query.to_lowercase();
        self.items
            .iter()
            .filter(|item| needle.is_empty() || item.matches_lowercase(&needle))
            .collect()
    }

    pub fn count_by_status(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|item| item.status() == status).count()
    }

    pub fn summary(&self) -> InventorySummary {
        InventorySummary::of(&self.items)
    }

    /// Pretty-printed JSON array of the current items.
    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.items)
    }
}
