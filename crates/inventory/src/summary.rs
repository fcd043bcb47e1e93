//! Dashboard totals derived from the current items.

use serde::Serialize;

use crate::item::{Item, ItemStatus};

/// Aggregate view of the inventory, recomputed on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventorySummary {
    pub total_items: usize,
    /// Sum of `stock` across items.
    pub total_units: u64,
    /// Sum of `price × stock` across items.
    pub total_value: f64,
    pub active: usize,
    pub low: usize,
    pub out: usize,
}

impl InventorySummary {
    pub fn of(items: &[Item]) -> Self {
        let mut summary = Self {
            total_items: items.len(),
            total_units: 0,
            total_value: 0.0,
            active: 0,
            low: 0,
            out: 0,
        };

        for item in items {
            summary.total_units += u64::from(item.stock());
            summary.total_value += item.stock_value();
            match item.status() {
                ItemStatus::Active => summary.active += 1,
                ItemStatus::Low => summary.low += 1,
                ItemStatus::Out => summary.out += 1,
            }
        }

        summary
    }

    pub fn count(&self, status: ItemStatus) -> usize {
        match status {
            ItemStatus::Active => self.active,
            ItemStatus::Low => self.low,
            ItemStatus::Out => self.out,
        }
    }
}
