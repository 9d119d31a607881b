//! Scheduling run configuration.
//!
//! Every named constant the engine consumes lives here or in the
//! per-module config structs this one aggregates — nothing is baked
//! into constraint or heuristic code. Defaults are documented on the
//! fields and are starting points for tuning, not validated business
//! rules.

use serde::{Deserialize, Serialize};

use crate::baseline::BaselineConfig;
use crate::duration::DurationConfig;
use crate::geometry::GeometryConfig;
use crate::solver::ObjectiveWeights;

/// Configuration for one wave-scheduling engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Slot width of the discretized horizon (minutes). Default 15.
    pub slot_minutes: i64,
    /// Planning horizon length (minutes). Default 24 hours.
    pub horizon_minutes: i64,
    /// Wall-clock budget for the constrained solve (seconds).
    pub solve_time_limit_seconds: u64,
    /// RNG seed for the bundled local-search backend.
    pub solver_seed: u64,
    /// Walking-time estimation constants.
    pub geometry: GeometryConfig,
    /// Stage-duration bases and complexity factors.
    pub duration: DurationConfig,
    /// Objective term weights.
    pub objective: ObjectiveWeights,
    /// Baseline queue thresholds.
    pub baseline: BaselineConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            slot_minutes: 15,
            horizon_minutes: 24 * 60,
            solve_time_limit_seconds: 30,
            solver_seed: 42,
            geometry: GeometryConfig::default(),
            duration: DurationConfig::default(),
            objective: ObjectiveWeights::default(),
            baseline: BaselineConfig::default(),
        }
    }
}
