//! Storage bin model.
//!
//! Bins carry the warehouse-local 3D coordinates the walking-time
//! estimator works from. Only the `geometry` module consumes them.

use serde::{Deserialize, Serialize};

/// A storage location in the warehouse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bin {
    /// Unique bin identifier.
    pub id: String,
    /// Aisle-axis coordinate (feet).
    pub x: f64,
    /// Cross-aisle coordinate (feet).
    pub y: f64,
    /// Shelf-height coordinate (feet).
    pub z: f64,
    /// Warehouse zone the bin belongs to.
    pub zone: i32,
    /// Shelf level (0 = floor).
    pub level: i32,
}

impl Bin {
    /// Creates a bin at the given coordinates.
    pub fn new(id: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            z,
            zone: 1,
            level: 0,
        }
    }

    /// Sets the zone.
    pub fn with_zone(mut self, zone: i32) -> Self {
        self.zone = zone;
        self
    }

    /// Sets the shelf level.
    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }
}
