//! SKU reference data.
//!
//! SKUs are immutable catalog entries: where an item lives (zone), how
//! long it takes to pick and pack one unit, and its physical size.
//! Order aggregates are derived from items × SKU (see `Order`).

use serde::{Deserialize, Serialize};

/// A stock-keeping unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sku {
    /// Unique SKU identifier.
    pub id: String,
    /// Warehouse zone the SKU is stored in (1 = closest to pack-out).
    pub zone: i32,
    /// Minutes to pick one unit.
    pub pick_time_minutes: f64,
    /// Minutes to pack one unit.
    pub pack_time_minutes: f64,
    /// Volume of one unit (cubic feet).
    pub volume: f64,
    /// Weight of one unit (pounds).
    pub weight: f64,
}

impl Sku {
    /// Creates a SKU with zeroed times and dimensions.
    pub fn new(id: impl Into<String>, zone: i32) -> Self {
        Self {
            id: id.into(),
            zone,
            pick_time_minutes: 0.0,
            pack_time_minutes: 0.0,
            volume: 0.0,
            weight: 0.0,
        }
    }

    /// Sets per-unit pick time (minutes).
    pub fn with_pick_time(mut self, minutes: f64) -> Self {
        self.pick_time_minutes = minutes;
        self
    }

    /// Sets per-unit pack time (minutes).
    pub fn with_pack_time(mut self, minutes: f64) -> Self {
        self.pack_time_minutes = minutes;
        self
    }

    /// Sets per-unit volume (cubic feet).
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    /// Sets per-unit weight (pounds).
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// A line item: one SKU and a quantity. Belongs to exactly one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Referenced SKU identifier.
    pub sku_id: String,
    /// Units ordered.
    pub quantity: u32,
}

impl OrderItem {
    /// Creates an order item.
    pub fn new(sku_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            sku_id: sku_id.into(),
            quantity,
        }
    }
}
