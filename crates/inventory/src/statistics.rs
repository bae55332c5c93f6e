//! Aggregate stock figures for dashboards.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::item::{Category, InventoryItem};
use crate::status::StockStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    pub count: u64,
    pub quantity: u64,
    pub value: u128,
}

/// Totals over a set of items. Every category is present, even when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryStatistics {
    pub total_items: u64,
    pub total_quantity: u64,
    pub total_value: u128,
    /// Items with `0 < quantity <= min_stock_level`, whatever their status.
    pub low_stock_count: u64,
    pub out_of_stock_count: u64,
    pub expired_count: u64,
    pub quarantined_count: u64,
    pub category_breakdown: BTreeMap<Category, CategoryTotals>,
}

impl Default for InventoryStatistics {
    fn default() -> Self {
        Self {
            total_items: 0,
            total_quantity: 0,
            total_value: 0,
            low_stock_count: 0,
            out_of_stock_count: 0,
            expired_count: 0,
            quarantined_count: 0,
            category_breakdown: Category::ALL
                .into_iter()
                .map(|c| (c, CategoryTotals::default()))
                .collect(),
        }
    }
}

impl InventoryStatistics {
    pub fn compute<'a>(items: impl IntoIterator<Item = &'a InventoryItem>) -> Self {
        let mut stats = Self::default();

        for item in items {
            let quantity = item.quantity();
            let value = item.total_value();

            stats.total_items += 1;
            stats.total_quantity = stats.total_quantity.saturating_add(quantity);
            stats.total_value += value;

            if quantity == 0 {
                stats.out_of_stock_count += 1;
            } else if quantity <= item.min_stock_level() {
                stats.low_stock_count += 1;
            }
            match item.status() {
                StockStatus::Expired => stats.expired_count += 1,
                StockStatus::Quarantined => stats.quarantined_count += 1,
                _ => {}
            }

            let totals = stats.category_breakdown.entry(item.category()).or_default();
            totals.count += 1;
            totals.quantity = totals.quantity.saturating_add(quantity);
            totals.value += value;
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{BinLocation, CreateItem, ItemDetails, Unit};
    use chrono::{TimeZone, Utc};
    use relieftrack_core::{InventoryItemId, OrganizationId, WarehouseId};

    fn item(category: Category, quantity: u64, min: u64, unit_cost: u64) -> InventoryItem {
        let (item, _) = InventoryItem::create(CreateItem {
            organization_id: OrganizationId::new(),
            item_id: InventoryItemId::new(),
            warehouse_id: WarehouseId::new(),
            details: ItemDetails {
                name: "stock".into(),
                description: None,
                category,
                unit: Unit::Pieces,
                unit_cost,
                min_stock_level: min,
                expiry_date: None,
                batch_number: None,
                location: BinLocation::default(),
            },
            quantity,
            occurred_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        })
        .unwrap();
        item
    }

    #[test]
    fn empty_input_lists_every_category() {
        let stats = InventoryStatistics::compute(std::iter::empty());
        assert_eq!(stats.total_items, 0);
        assert_eq!(stats.category_breakdown.len(), Category::ALL.len());
        assert!(stats.category_breakdown.values().all(|t| *t == CategoryTotals::default()));
    }

    #[test]
    fn counts_low_and_out_of_stock_separately() {
        let items = vec![
            item(Category::Food, 1000, 100, 2),
            item(Category::Food, 100, 100, 2),
            item(Category::Water, 0, 10, 1),
            item(Category::Medical, 5, 10, 300),
        ];

        let stats = InventoryStatistics::compute(&items);

        assert_eq!(stats.total_items, 4);
        assert_eq!(stats.total_quantity, 1105);
        assert_eq!(stats.total_value, 1000 * 2 + 100 * 2 + 5 * 300);
        assert_eq!(stats.low_stock_count, 2);
        assert_eq!(stats.out_of_stock_count, 1);

        let food = stats.category_breakdown[&Category::Food];
        assert_eq!(food.count, 2);
        assert_eq!(food.quantity, 1100);
        assert_eq!(stats.category_breakdown[&Category::Shelter].count, 0);
    }

    #[test]
    fn quarantined_items_are_counted() {
        let (q, _) = item(Category::Medical, 50, 10, 1).set_quarantine(true, Utc::now());
        let stats = InventoryStatistics::compute([&q]);
        assert_eq!(stats.quarantined_count, 1);
    }
}
