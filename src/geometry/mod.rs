//! Walking-time estimation from bin geometry.
//!
//! Converts warehouse bin coordinates into the walking-time inputs the
//! duration model consumes. Distance is a per-axis-weighted Manhattan
//! metric with the vertical axis weighted heaviest, plus fixed
//! penalties for crossing zones or shelf levels.
//!
//! # Cache Model
//!
//! One service instance may be shared across concurrent scheduling
//! runs. Per-pair results are memoized behind a `RwLock`;
//! [`GeometryDistanceService::recompute_all`] computes the full N×N
//! matrix off-lock and swaps it in as a single assignment, so readers
//! never observe a partially populated matrix.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{Bin, Order};

/// Geometry constants. All penalties and the speed are configuration
/// inputs; the defaults below are the documented fallbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Aisle-axis distance weight.
    pub weight_x: f64,
    /// Cross-aisle distance weight.
    pub weight_y: f64,
    /// Vertical movement weight; configured above the horizontal
    /// weights to penalize shelf-height traversal.
    pub weight_z: f64,
    /// Walking speed in feet per minute.
    pub walking_speed_feet_per_minute: f64,
    /// Fixed penalty (minutes) added once when the bins are in
    /// different zones.
    pub cross_zone_penalty_minutes: f64,
    /// Fixed penalty (minutes) added once when the bins are on
    /// different shelf levels.
    pub cross_level_penalty_minutes: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            weight_x: 1.0,
            weight_y: 1.0,
            weight_z: 3.0,
            walking_speed_feet_per_minute: 250.0,
            cross_zone_penalty_minutes: 0.5,
            cross_level_penalty_minutes: 0.25,
        }
    }
}

/// One cached walking-time result for an ordered bin pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkingTimeEntry {
    /// Origin bin identifier.
    pub from_bin: String,
    /// Destination bin identifier.
    pub to_bin: String,
    /// Weighted Manhattan distance (feet).
    pub distance_feet: f64,
    /// Walking time including zone/level penalties (minutes).
    pub minutes: f64,
}

/// Walking time for an order's full bin visitation sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkingTime {
    /// Total minutes walked between consecutive resolved bins.
    pub minutes: f64,
    /// True when at least one item's bin could not be resolved and its
    /// legs were counted as zero.
    pub degraded: bool,
}

#[derive(Debug)]
struct GeometryState {
    bins: HashMap<String, Bin>,
    sku_bins: HashMap<String, String>,
    cache: HashMap<(String, String), WalkingTimeEntry>,
}

/// Walking-time estimator over a bin snapshot.
///
/// Holds the only state the scheduling core shares across invocations.
/// Missing bin data is a degraded-but-non-fatal condition: the affected
/// leg contributes zero walking time and a data-quality warning is
/// logged, never an error.
#[derive(Debug)]
pub struct GeometryDistanceService {
    config: GeometryConfig,
    state: RwLock<GeometryState>,
}

impl GeometryDistanceService {
    /// Creates a service over a bin snapshot and a SKU → bin mapping.
    pub fn new(
        bins: Vec<Bin>,
        sku_bins: HashMap<String, String>,
        config: GeometryConfig,
    ) -> Self {
        let bins = bins.into_iter().map(|b| (b.id.clone(), b)).collect();
        Self {
            config,
            state: RwLock::new(GeometryState {
                bins,
                sku_bins,
                cache: HashMap::new(),
            }),
        }
    }

    /// The configuration in effect.
    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }

    /// Number of known bins.
    pub fn bin_count(&self) -> usize {
        self.state.read().map(|s| s.bins.len()).unwrap_or(0)
    }

    /// Walking distance and time between two bins, memoized per ordered
    /// pair. Returns `None` when either bin is unknown.
    pub fn distance(&self, from_bin: &str, to_bin: &str) -> Option<WalkingTimeEntry> {
        let key = (from_bin.to_string(), to_bin.to_string());
        let state = self.state.read().ok()?;
        if let Some(entry) = state.cache.get(&key) {
            return Some(entry.clone());
        }
        let from = state.bins.get(from_bin)?;
        let to = state.bins.get(to_bin)?;
        let entry = self.compute_entry(from, to);
        drop(state);

        if let Ok(mut state) = self.state.write() {
            state.cache.insert(key, entry.clone());
        }
        Some(entry)
    }

    /// Total walking time along an order's bin visitation sequence.
    ///
    /// Bins are visited in item order. Orders touching at most one
    /// resolvable bin walk zero minutes. Items whose SKU has no known
    /// bin contribute zero for their legs and mark the result degraded.
    pub fn total_walking_time_for_order(&self, order: &Order) -> WalkingTime {
        let mut minutes = 0.0;
        let mut degraded = false;
        let mut prev: Option<String> = None;

        for item in &order.items {
            let bin_id = {
                let state = match self.state.read() {
                    Ok(s) => s,
                    Err(_) => return WalkingTime { minutes, degraded: true },
                };
                state
                    .sku_bins
                    .get(&item.sku_id)
                    .filter(|bin_id| state.bins.contains_key(*bin_id))
                    .cloned()
            };

            match bin_id {
                Some(bin_id) => {
                    if let Some(prev_id) = prev.as_deref() {
                        if let Some(entry) = self.distance(prev_id, &bin_id) {
                            minutes += entry.minutes;
                        }
                    }
                    prev = Some(bin_id);
                }
                None => {
                    warn!(
                        order_id = %order.id,
                        sku_id = %item.sku_id,
                        "no bin known for SKU; leg contributes zero walking time"
                    );
                    degraded = true;
                }
            }
        }

        WalkingTime { minutes, degraded }
    }

    /// Clears the cache and recomputes the full N×N matrix, swapping it
    /// in as one assignment. Returns the number of entries computed.
    ///
    /// O(N²) in the bin count; intended for bulk precomputation before
    /// a matrix export.
    pub fn recompute_all(&self) -> usize {
        let bins: Vec<Bin> = match self.state.read() {
            Ok(s) => s.bins.values().cloned().collect(),
            Err(_) => return 0,
        };
        let fresh = self.full_matrix(&bins);
        let count = fresh.len();
        if let Ok(mut state) = self.state.write() {
            state.cache = fresh;
        }
        count
    }

    /// Replaces the bin snapshot and recomputes the matrix atomically.
    ///
    /// After this call no entry computed from the old coordinates
    /// remains cached.
    pub fn rebuild(&self, bins: Vec<Bin>) -> usize {
        let fresh = self.full_matrix(&bins);
        let count = fresh.len();
        if let Ok(mut state) = self.state.write() {
            state.bins = bins.into_iter().map(|b| (b.id.clone(), b)).collect();
            state.cache = fresh;
        }
        count
    }

    /// Full walking-time matrix as ordered (from, to) tuples, sorted by
    /// bin pair, for bulk persistence by an external collaborator.
    pub fn export_matrix(&self) -> Vec<WalkingTimeEntry> {
        let bins: Vec<Bin> = match self.state.read() {
            Ok(s) => s.bins.values().cloned().collect(),
            Err(_) => return Vec::new(),
        };
        let mut entries: Vec<WalkingTimeEntry> =
            self.full_matrix(&bins).into_values().collect();
        entries.sort_by(|a, b| (&a.from_bin, &a.to_bin).cmp(&(&b.from_bin, &b.to_bin)));
        entries
    }

    fn full_matrix(&self, bins: &[Bin]) -> HashMap<(String, String), WalkingTimeEntry> {
        let mut matrix = HashMap::with_capacity(bins.len() * bins.len());
        for from in bins {
            for to in bins {
                matrix.insert(
                    (from.id.clone(), to.id.clone()),
                    self.compute_entry(from, to),
                );
            }
        }
        matrix
    }

    fn compute_entry(&self, from: &Bin, to: &Bin) -> WalkingTimeEntry {
        let c = &self.config;
        let distance_feet = (from.x - to.x).abs() * c.weight_x
            + (from.y - to.y).abs() * c.weight_y
            + (from.z - to.z).abs() * c.weight_z;

        let mut minutes = distance_feet / c.walking_speed_feet_per_minute;
        if from.zone != to.zone {
            minutes += c.cross_zone_penalty_minutes;
        }
        if from.level != to.level {
            minutes += c.cross_level_penalty_minutes;
        }

        WalkingTimeEntry {
            from_bin: from.id.clone(),
            to_bin: to.id.clone(),
            distance_feet,
            minutes,
        }
    }
}
