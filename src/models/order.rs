//! Order model.
//!
//! An order is the unit of scheduling: it passes through all six
//! processing stages and carries the deadline the schedule is measured
//! against.
//!
//! # Derived Aggregates
//!
//! `total_pick_time`, `total_pack_time`, `total_volume`, and
//! `total_weight` are cached sums over items × SKU catalog. They are
//! derived data: whenever `items` changes they must be refreshed with
//! [`Order::recompute_aggregates`], never edited directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{OrderItem, Sku};

/// A customer order to be scheduled through the six stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    pub id: String,
    /// Owning customer identifier.
    pub customer_id: String,
    /// Whether the customer is on a premium service level.
    pub premium: bool,
    /// Scheduling priority: 1 = highest, 5 = lowest.
    pub priority: u8,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// Latest acceptable ship completion time.
    pub shipping_deadline: DateTime<Utc>,
    /// Line items.
    pub items: Vec<OrderItem>,
    /// Cached: sum of item pick times (minutes).
    pub total_pick_time: f64,
    /// Cached: sum of item pack times (minutes).
    pub total_pack_time: f64,
    /// Cached: total volume (cubic feet).
    pub total_volume: f64,
    /// Cached: total weight (pounds).
    pub total_weight: f64,
}

impl Order {
    /// Creates an order with no items and zeroed aggregates.
    pub fn new(
        id: impl Into<String>,
        customer_id: impl Into<String>,
        shipping_deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            customer_id: customer_id.into(),
            premium: false,
            priority: 3,
            created_at: shipping_deadline,
            shipping_deadline,
            items: Vec::new(),
            total_pick_time: 0.0,
            total_pack_time: 0.0,
            total_volume: 0.0,
            total_weight: 0.0,
        }
    }

    /// Sets the priority (clamped to 1..=5).
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority.clamp(1, 5);
        self
    }

    /// Marks the customer as premium.
    pub fn with_premium(mut self, premium: bool) -> Self {
        self.premium = premium;
        self
    }

    /// Sets the creation timestamp.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Adds a line item. Aggregates are stale until recomputed.
    pub fn with_item(mut self, item: OrderItem) -> Self {
        self.items.push(item);
        self
    }

    /// Recomputes the cached aggregates from items × SKU catalog.
    ///
    /// Items referencing an unknown SKU contribute nothing; the caller
    /// decides whether that is worth reporting (see `validation`).
    pub fn recompute_aggregates(&mut self, skus: &HashMap<String, Sku>) {
        let mut pick = 0.0;
        let mut pack = 0.0;
        let mut volume = 0.0;
        let mut weight = 0.0;

        for item in &self.items {
            if let Some(sku) = skus.get(&item.sku_id) {
                let qty = item.quantity as f64;
                pick += sku.pick_time_minutes * qty;
                pack += sku.pack_time_minutes * qty;
                volume += sku.volume * qty;
                weight += sku.weight * qty;
            }
        }

        self.total_pick_time = pick;
        self.total_pack_time = pack;
        self.total_volume = volume;
        self.total_weight = weight;
    }

    /// Total number of units across all items.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Whether the order has any items.
    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sku_catalog() -> HashMap<String, Sku> {
        let mut skus = HashMap::new();
        skus.insert(
            "A".to_string(),
            Sku::new("A", 1)
                .with_pick_time(2.0)
                .with_pack_time(1.0)
                .with_volume(0.5)
                .with_weight(2.0),
        );
        skus.insert(
            "B".to_string(),
            Sku::new("B", 2)
                .with_pick_time(1.0)
                .with_pack_time(0.5)
                .with_volume(1.0)
                .with_weight(4.0),
        );
        skus
    }

    fn deadline() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 16, 0, 0).unwrap()
    }

    #[test]
    fn test_recompute_aggregates() {
        let mut order = Order::new("O1", "C1", deadline())
            .with_item(OrderItem::new("A", 2))
            .with_item(OrderItem::new("B", 1));
        order.recompute_aggregates(&sku_catalog());

        // pick: 2*2.0 + 1*1.0 = 5.0, pack: 2*1.0 + 1*0.5 = 2.5
        assert!((order.total_pick_time - 5.0).abs() < 1e-10);
        assert!((order.total_pack_time - 2.5).abs() < 1e-10);
        // volume: 2*0.5 + 1*1.0 = 2.0, weight: 2*2.0 + 1*4.0 = 8.0
        assert!((order.total_volume - 2.0).abs() < 1e-10);
        assert!((order.total_weight - 8.0).abs() < 1e-10);
        assert_eq!(order.item_count(), 3);
    }

    #[test]
    fn test_unknown_sku_contributes_nothing() {
        let mut order = Order::new("O1", "C1", deadline())
            .with_item(OrderItem::new("MISSING", 10));
        order.recompute_aggregates(&sku_catalog());
        assert!((order.total_pick_time - 0.0).abs() < 1e-10);
        assert_eq!(order.item_count(), 10);
    }

    #[test]
    fn test_priority_clamped() {
        let order = Order::new("O1", "C1", deadline()).with_priority(9);
        assert_eq!(order.priority, 5);
        let order = Order::new("O2", "C1", deadline()).with_priority(0);
        assert_eq!(order.priority, 1);
    }

    #[test]
    fn test_empty_order() {
        let mut order = Order::new("O1", "C1", deadline());
        order.recompute_aggregates(&sku_catalog());
        assert!(!order.has_items());
        assert_eq!(order.item_count(), 0);
        assert!((order.total_pick_time - 0.0).abs() < 1e-10);
    }
}
