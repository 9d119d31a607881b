//! Equipment model.
//!
//! Equipment units are the capacity-limited machines stages occupy.
//! Unlike workers, a single unit may host several concurrent uses
//! (`capacity` > 1 — conveyors in particular), so capacity checks count
//! overlapping assignments rather than enforcing exclusivity.

use serde::{Deserialize, Serialize};

/// Equipment classification from the fixed enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentType {
    PackingStation,
    DockDoor,
    PickCart,
    Conveyor,
    LabelPrinter,
}

impl EquipmentType {
    /// Stable snake_case name for logs and exports.
    pub fn name(self) -> &'static str {
        match self {
            EquipmentType::PackingStation => "packing_station",
            EquipmentType::DockDoor => "dock_door",
            EquipmentType::PickCart => "pick_cart",
            EquipmentType::Conveyor => "conveyor",
            EquipmentType::LabelPrinter => "label_printer",
        }
    }
}

impl std::fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A piece of equipment available to the wave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    /// Unique equipment identifier.
    pub id: String,
    /// Equipment classification.
    pub equipment_type: EquipmentType,
    /// Maximum concurrent uses of this unit.
    pub capacity: u32,
    /// Operating cost per hour of use.
    pub hourly_cost: f64,
    /// Throughput multiplier (1.0 = nominal).
    pub efficiency_factor: f64,
}

impl Equipment {
    /// Creates a single-capacity unit with zero cost.
    pub fn new(id: impl Into<String>, equipment_type: EquipmentType) -> Self {
        Self {
            id: id.into(),
            equipment_type,
            capacity: 1,
            hourly_cost: 0.0,
            efficiency_factor: 1.0,
        }
    }

    /// Sets the concurrent-use capacity (floored at 1).
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Sets the hourly operating cost.
    pub fn with_hourly_cost(mut self, cost: f64) -> Self {
        self.hourly_cost = cost;
        self
    }

    /// Sets the efficiency factor (floored at a small positive value).
    pub fn with_efficiency(mut self, factor: f64) -> Self {
        self.efficiency_factor = factor.max(0.01);
        self
    }
}
