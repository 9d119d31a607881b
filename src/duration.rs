//! Per-stage duration derivation.
//!
//! Turns order aggregates and walking-time estimates into the stage
//! durations every scheduler path consumes. Pick and pack durations
//! come straight from the order's cached aggregates; the remaining
//! stages use a configurable base scaled by a complexity factor of the
//! relevant aggregate. The production path is fully deterministic.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geometry::GeometryDistanceService;
use crate::models::{Order, StageType};

/// Base durations and complexity factors for the non-pick, non-pack
/// stages. Heuristic constants, exposed for tuning rather than
/// hard-coded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationConfig {
    /// Floor applied to every stage duration (minutes), keeping the
    /// horizon well-defined for degenerate zero-item orders.
    pub minimum_stage_minutes: f64,
    /// Consolidation base (minutes).
    pub consolidate_base_minutes: f64,
    /// Consolidation minutes added per item unit.
    pub consolidate_per_item_minutes: f64,
    /// Labeling base (minutes).
    pub label_base_minutes: f64,
    /// Labeling minutes added per item unit.
    pub label_per_item_minutes: f64,
    /// Staging base (minutes).
    pub stage_base_minutes: f64,
    /// Staging minutes added per cubic foot of order volume.
    pub stage_per_cubic_foot_minutes: f64,
    /// Shipping base (minutes).
    pub ship_base_minutes: f64,
    /// Shipping minutes added per pound of order weight.
    pub ship_per_pound_minutes: f64,
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self {
            minimum_stage_minutes: 1.0,
            consolidate_base_minutes: 5.0,
            consolidate_per_item_minutes: 0.2,
            label_base_minutes: 2.0,
            label_per_item_minutes: 0.1,
            stage_base_minutes: 4.0,
            stage_per_cubic_foot_minutes: 0.05,
            ship_base_minutes: 6.0,
            ship_per_pound_minutes: 0.01,
        }
    }
}

/// A derived duration, tagged when a degraded default was involved
/// (missing bin data, or the minimum floor kicking in for a
/// zero-item order). Degraded results are still usable; the tag exists
/// so callers can report data quality without exception control flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationResult {
    /// Duration in minutes, never below the configured floor.
    pub minutes: f64,
    /// True when a degraded default contributed to the value.
    pub degraded: bool,
}

/// Derives per-(order, stage) durations.
pub struct StageDurationModel {
    geometry: Arc<GeometryDistanceService>,
    config: DurationConfig,
}

impl StageDurationModel {
    /// Creates a duration model over a shared geometry service.
    pub fn new(geometry: Arc<GeometryDistanceService>, config: DurationConfig) -> Self {
        Self { geometry, config }
    }

    /// The configuration in effect.
    pub fn config(&self) -> &DurationConfig {
        &self.config
    }

    /// Duration of one stage for one order (minutes).
    ///
    /// - Pick: total pick time + walking time over the bin sequence.
    /// - Pack: total pack time.
    /// - Others: stage base scaled by the stage's complexity input
    ///   (item count, volume, or weight).
    pub fn duration(&self, order: &Order, stage: StageType) -> DurationResult {
        let c = &self.config;
        let items = order.item_count() as f64;

        let (raw, mut degraded) = match stage {
            StageType::Pick => {
                let walking = self.geometry.total_walking_time_for_order(order);
                (order.total_pick_time + walking.minutes, walking.degraded)
            }
            StageType::Pack => (order.total_pack_time, false),
            StageType::Consolidate => (
                c.consolidate_base_minutes + c.consolidate_per_item_minutes * items,
                false,
            ),
            StageType::Label => (c.label_base_minutes + c.label_per_item_minutes * items, false),
            StageType::Stage => (
                c.stage_base_minutes + c.stage_per_cubic_foot_minutes * order.total_volume,
                false,
            ),
            StageType::Ship => (
                c.ship_base_minutes + c.ship_per_pound_minutes * order.total_weight,
                false,
            ),
        };

        let minutes = if raw < c.minimum_stage_minutes {
            degraded = degraded || !order.has_items();
            c.minimum_stage_minutes
        } else {
            raw
        };

        DurationResult { minutes, degraded }
    }

    /// Durations for all six stages in precedence order.
    pub fn stage_durations(&self, order: &Order) -> [DurationResult; 6] {
        StageType::ALL.map(|stage| self.duration(order, stage))
    }
}
