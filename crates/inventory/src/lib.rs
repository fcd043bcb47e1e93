//! Inventory domain module.
//!
//! This crate contains business rules for the item collection, implemented
//! purely as deterministic in-memory logic (no IO, no rendering).

pub mod item;
pub mod sample;
pub mod store;
pub mod summary;

pub use item::{
    Item, ItemFields, ItemInput, ItemStatus, LOW_STOCK_THRESHOLD, coerce_price, coerce_stock,
    status_of,
};
pub use sample::sample_items;
pub use store::InventoryStore;
pub use summary::InventorySummary;
