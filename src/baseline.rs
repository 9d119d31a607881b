//! Current-state comparison sequencer.
//!
//! Reproduces a realistic incumbent policy — zone-batched waves, a
//! single linear timeline, least-loaded assignment, and reactive
//! queue-triggered reallocation — so the value of the optimized
//! schedule can be quantified against it. Never used for production
//! assignment decisions.
//!
//! # Algorithm
//!
//! 1. Sort orders by (deadline, priority, zone-efficiency score
//!    descending); the score favors orders concentrated in
//!    faster-access low-numbered zones.
//! 2. Batch orders by primary zone and process batches in zone order.
//! 3. Within a batch, walk the six stages per order against a single
//!    advancing wall-clock pointer, choosing the least-loaded
//!    matching-skill worker and the least-used unit as the fallback
//!    scheduler does.
//! 4. After each order, recompute per-stage queue lengths; when a
//!    queue exceeds its threshold and a lightly-loaded skilled worker
//!    exists, record a reassignment event moving that worker's
//!    attention to the bottleneck stage.

use std::collections::HashMap;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::duration::StageDurationModel;
use crate::models::{Equipment, Order, OrderSchedule, Sku, StageSchedule, StageType, Worker};

/// Queue thresholds and the light-load bound for the reallocation
/// step. Documented defaults; exposed for tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// Pack-stage queue length that triggers reallocation.
    pub pack_queue_threshold: usize,
    /// Ship-stage queue length that triggers reallocation.
    pub ship_queue_threshold: usize,
    /// Consolidate-stage queue length that triggers reallocation.
    pub consolidate_queue_threshold: usize,
    /// A worker with fewer assignments than this in the current batch
    /// counts as lightly loaded.
    pub light_load_max_assignments: usize,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            pack_queue_threshold: 5,
            ship_queue_threshold: 3,
            consolidate_queue_threshold: 8,
            light_load_max_assignments: 3,
        }
    }
}

impl BaselineConfig {
    /// The reallocation threshold for a stage, if that stage is
    /// watched.
    fn threshold(&self, stage: StageType) -> Option<usize> {
        match stage {
            StageType::Pack => Some(self.pack_queue_threshold),
            StageType::Ship => Some(self.ship_queue_threshold),
            StageType::Consolidate => Some(self.consolidate_queue_threshold),
            _ => None,
        }
    }
}

/// One reactive rebalancing decision, kept for comparison reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReassignmentEvent {
    /// When the bottleneck was noticed.
    pub at: DateTime<Utc>,
    /// The worker whose attention moved.
    pub worker_id: String,
    /// The bottleneck stage.
    pub stage: StageType,
    /// Queue length that triggered the move.
    pub queue_length: usize,
}

/// What the baseline run produced.
#[derive(Debug, Clone)]
pub struct BaselineOutcome {
    /// One schedule per order, in input order.
    pub schedules: Vec<OrderSchedule>,
    /// Reassignment log, in the order the moves happened.
    pub events: Vec<ReassignmentEvent>,
}

/// Produces the deliberately non-optimal comparison schedule.
pub struct BaselineSequencer<'a> {
    durations: &'a StageDurationModel,
    config: BaselineConfig,
}

impl<'a> BaselineSequencer<'a> {
    /// Creates a sequencer over a duration model.
    pub fn new(durations: &'a StageDurationModel, config: BaselineConfig) -> Self {
        Self { durations, config }
    }

    /// Runs the baseline policy over one wave.
    pub fn sequence(
        &self,
        orders: &[Order],
        workers: &[Worker],
        equipment: &[Equipment],
        skus: &HashMap<String, Sku>,
        reference_start: DateTime<Utc>,
    ) -> BaselineOutcome {
        let mut sorted: Vec<usize> = (0..orders.len()).collect();
        sorted.sort_by(|&a, &b| {
            let oa = &orders[a];
            let ob = &orders[b];
            oa.shipping_deadline
                .cmp(&ob.shipping_deadline)
                .then(oa.priority.cmp(&ob.priority))
                .then(
                    zone_efficiency_score(ob, skus)
                        .partial_cmp(&zone_efficiency_score(oa, skus))
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(oa.id.cmp(&ob.id))
        });

        // Batch by primary zone, batches in zone order; the sort order
        // is preserved inside each batch.
        let mut batches: Vec<(i32, Vec<usize>)> = Vec::new();
        for &order_idx in &sorted {
            let zone = primary_zone(&orders[order_idx], skus);
            match batches.iter_mut().find(|(z, _)| *z == zone) {
                Some((_, members)) => members.push(order_idx),
                None => batches.push((zone, vec![order_idx])),
            }
        }
        batches.sort_by_key(|(zone, _)| *zone);

        let mut worker_minutes = vec![0.0_f64; workers.len()];
        let mut unit_minutes = vec![0.0_f64; equipment.len()];
        let mut focus: Vec<Option<StageType>> = vec![None; workers.len()];
        let mut schedules: Vec<Option<OrderSchedule>> = vec![None; orders.len()];
        let mut events = Vec::new();
        // Single linear timeline, whole seconds from the reference.
        let mut clock = 0_i64;
        let mut processed = 0_usize;

        for (_, members) in &batches {
            // Reallocation judges load within the current batch.
            let mut batch_assignments = vec![0_usize; workers.len()];

            for &order_idx in members {
                let order = &orders[order_idx];
                let mut stages = Vec::with_capacity(StageType::ALL.len());

                for stage in StageType::ALL {
                    let base_minutes = self.durations.duration(order, stage).minutes;
                    let worker_idx =
                        pick_worker(workers, &worker_minutes, &focus, stage);
                    let unit_idx = stage
                        .equipment_type()
                        .and_then(|required| pick_unit(equipment, &unit_minutes, required));

                    let mut minutes = base_minutes;
                    if let Some(w) = worker_idx {
                        minutes /= workers[w].efficiency_factor;
                    }
                    if let Some(u) = unit_idx {
                        minutes /= equipment[u].efficiency_factor;
                    }
                    let duration_secs = (minutes * 60.0).round() as i64;

                    let mut schedule = StageSchedule::new(
                        &order.id,
                        stage,
                        reference_start + ChronoDuration::seconds(clock),
                        minutes,
                    );
                    if let Some(w) = worker_idx {
                        schedule = schedule.with_worker(&workers[w].id);
                        worker_minutes[w] += minutes;
                        batch_assignments[w] += 1;
                    }
                    if let Some(u) = unit_idx {
                        schedule = schedule.with_equipment(&equipment[u].id);
                        unit_minutes[u] += minutes;
                    }
                    stages.push(schedule);
                    clock += duration_secs;
                }

                schedules[order_idx] =
                    Some(OrderSchedule::from_stages(&order.id, stages, order.shipping_deadline));
                processed += 1;

                self.adjust_resource_allocation(
                    orders.len() - processed,
                    workers,
                    &batch_assignments,
                    &mut focus,
                    reference_start + ChronoDuration::seconds(clock),
                    &mut events,
                );
            }
        }

        BaselineOutcome {
            schedules: schedules.into_iter().flatten().collect(),
            events,
        }
    }

    /// Reactive rebalancing: every not-yet-processed order still owes
    /// one instance of each stage, so the per-stage queue length is the
    /// remaining order count. When a watched stage's queue exceeds its
    /// threshold, the first lightly-loaded skilled worker not already
    /// focused there is pointed at it.
    fn adjust_resource_allocation(
        &self,
        remaining_orders: usize,
        workers: &[Worker],
        batch_assignments: &[usize],
        focus: &mut [Option<StageType>],
        at: DateTime<Utc>,
        events: &mut Vec<ReassignmentEvent>,
    ) {
        for stage in StageType::ALL {
            let Some(threshold) = self.config.threshold(stage) else {
                continue;
            };
            if remaining_orders <= threshold {
                continue;
            }

            let skill = stage.required_skill();
            let candidate = (0..workers.len()).find(|&w| {
                workers[w].has_skill(skill)
                    && batch_assignments[w] < self.config.light_load_max_assignments
                    && focus[w] != Some(stage)
            });
            if let Some(w) = candidate {
                info!(
                    worker_id = %workers[w].id,
                    stage = %stage,
                    queue_length = remaining_orders,
                    "queue over threshold; moving worker attention to bottleneck stage"
                );
                focus[w] = Some(stage);
                events.push(ReassignmentEvent {
                    at,
                    worker_id: workers[w].id.clone(),
                    stage,
                    queue_length: remaining_orders,
                });
            }
        }
    }
}

/// Quantity-weighted sum of 1/zone over an order's items. Higher means
/// the order concentrates in low-numbered, faster-access zones.
fn zone_efficiency_score(order: &Order, skus: &HashMap<String, Sku>) -> f64 {
    order
        .items
        .iter()
        .filter_map(|item| {
            skus.get(&item.sku_id)
                .map(|sku| item.quantity as f64 / sku.zone.max(1) as f64)
        })
        .sum()
}

/// The zone an order's batch is keyed on: the quantity-weighted mode
/// of its item zones, lowest zone on ties. Orders with no resolvable
/// items batch as zone 0, ahead of everything.
fn primary_zone(order: &Order, skus: &HashMap<String, Sku>) -> i32 {
    let mut weights: HashMap<i32, u32> = HashMap::new();
    for item in &order.items {
        if let Some(sku) = skus.get(&item.sku_id) {
            *weights.entry(sku.zone).or_insert(0) += item.quantity;
        }
    }
    weights
        .into_iter()
        .max_by_key(|&(zone, weight)| (weight, std::cmp::Reverse(zone)))
        .map(|(zone, _)| zone)
        .unwrap_or(0)
}

/// Least-loaded matching-skill worker, a focused worker winning ties
/// for its stage; any worker when none match. `None` only with no
/// workers at all.
fn pick_worker(
    workers: &[Worker],
    worker_minutes: &[f64],
    focus: &[Option<StageType>],
    stage: StageType,
) -> Option<usize> {
    let skill = stage.required_skill();
    let key = |w: usize| {
        let focused = focus[w] == Some(stage);
        (if focused { 0_u8 } else { 1 }, worker_minutes[w], w)
    };
    let least = |pool: &mut dyn Iterator<Item = usize>| {
        pool.min_by(|&a, &b| {
            let (fa, ma, ia) = key(a);
            let (fb, mb, ib) = key(b);
            fa.cmp(&fb)
                .then(ma.partial_cmp(&mb).unwrap_or(std::cmp::Ordering::Equal))
                .then(ia.cmp(&ib))
        })
    };

    least(&mut (0..workers.len()).filter(|&w| workers[w].has_skill(skill)))
        .or_else(|| least(&mut (0..workers.len())))
}

fn pick_unit(
    equipment: &[Equipment],
    unit_minutes: &[f64],
    required: crate::models::EquipmentType,
) -> Option<usize> {
    (0..equipment.len())
        .filter(|&u| equipment[u].equipment_type == required)
        .min_by(|&a, &b| {
            unit_minutes[a]
                .partial_cmp(&unit_minutes[b])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        })
}
