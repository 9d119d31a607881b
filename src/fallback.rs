//! Guaranteed-result list scheduler.
//!
//! The safety net behind the constrained path: a deterministic greedy
//! scheduler that always terminates with a complete schedule, whatever
//! the wave looks like. Orders go in (priority, deadline) order; each
//! stage takes the least-loaded qualified worker and the least-utilized
//! equipment unit of the mapped type, starting at the latest of the
//! previous stage's end, the worker's next-free time, and the unit's
//! next-free time.
//!
//! # Complexity
//! O(n · s · r) where n = orders, s = six stages, r = candidate
//! resources per stage.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::debug;

use crate::duration::StageDurationModel;
use crate::models::{Equipment, Order, OrderSchedule, StageSchedule, StageType, Worker};

/// Deterministic greedy earliest-deadline-first scheduler.
///
/// Never fails: a wave with no workers or missing equipment still gets
/// a complete schedule, with the affected assignment fields left empty.
/// Worker and equipment efficiency factors scale assigned durations,
/// since here the resource choice is known when the stage is timed.
pub struct FallbackListScheduler<'a> {
    durations: &'a StageDurationModel,
}

impl<'a> FallbackListScheduler<'a> {
    /// Creates a scheduler over a duration model.
    pub fn new(durations: &'a StageDurationModel) -> Self {
        Self { durations }
    }

    /// Schedules every order through all six stages.
    ///
    /// Returns one schedule per order, in input order.
    pub fn schedule(
        &self,
        orders: &[Order],
        workers: &[Worker],
        equipment: &[Equipment],
        reference_start: DateTime<Utc>,
    ) -> Vec<OrderSchedule> {
        // Internal time is whole seconds from the reference start, so
        // chained stage ends and emitted timestamps agree exactly.
        let mut worker_free = vec![0_i64; workers.len()];
        let mut worker_minutes = vec![0.0_f64; workers.len()];
        // One free-time track per unit of capacity. Snapshots are
        // external, so a zero capacity is treated as one.
        let mut channel_free: Vec<Vec<i64>> = equipment
            .iter()
            .map(|e| vec![0_i64; e.capacity.max(1) as usize])
            .collect();
        let mut unit_minutes = vec![0.0_f64; equipment.len()];

        let mut sequence: Vec<usize> = (0..orders.len()).collect();
        sequence.sort_by(|&a, &b| {
            let oa = &orders[a];
            let ob = &orders[b];
            (oa.priority, oa.shipping_deadline, &oa.id).cmp(&(
                ob.priority,
                ob.shipping_deadline,
                &ob.id,
            ))
        });

        let mut schedules: Vec<Option<OrderSchedule>> = vec![None; orders.len()];

        for &order_idx in &sequence {
            let order = &orders[order_idx];
            let mut stages = Vec::with_capacity(StageType::ALL.len());
            let mut prev_end = 0_i64;

            for stage in StageType::ALL {
                let base_minutes = self.durations.duration(order, stage).minutes;

                let worker_idx = pick_worker(workers, &worker_minutes, stage);
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

                let mut start = prev_end;
                if let Some(w) = worker_idx {
                    start = start.max(worker_free[w]);
                }
                let channel = unit_idx.map(|u| {
                    let (channel, &free) = channel_free[u]
                        .iter()
                        .enumerate()
                        .min_by_key(|(_, &free)| free)
                        .unwrap_or((0, &0));
                    start = start.max(free);
                    channel
                });
                let end = start + duration_secs;

                if let Some(w) = worker_idx {
                    worker_free[w] = end;
                    worker_minutes[w] += minutes;
                }
                if let (Some(u), Some(ch)) = (unit_idx, channel) {
                    channel_free[u][ch] = end;
                    unit_minutes[u] += minutes;
                }

                let mut schedule = StageSchedule::new(
                    &order.id,
                    stage,
                    reference_start + ChronoDuration::seconds(start),
                    minutes,
                );
                if let Some(w) = worker_idx {
                    schedule = schedule.with_worker(&workers[w].id);
                }
                if let Some(u) = unit_idx {
                    schedule = schedule.with_equipment(&equipment[u].id);
                }
                stages.push(schedule);
                prev_end = end;
            }

            schedules[order_idx] =
                Some(OrderSchedule::from_stages(&order.id, stages, order.shipping_deadline));
        }

        debug!(
            orders = orders.len(),
            workers = workers.len(),
            "fallback list scheduler produced a complete schedule"
        );

        schedules.into_iter().flatten().collect()
    }
}

/// Least-loaded worker qualified for the stage, or the globally
/// least-loaded worker when nobody holds the skill. `None` only when
/// the wave has no workers at all.
fn pick_worker(workers: &[Worker], worker_minutes: &[f64], stage: StageType) -> Option<usize> {
    let skill = stage.required_skill();
    let least_loaded = |pool: &mut dyn Iterator<Item = usize>| {
        pool.min_by(|&a, &b| {
            worker_minutes[a]
                .partial_cmp(&worker_minutes[b])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        })
    };

    let qualified = least_loaded(
        &mut (0..workers.len()).filter(|&w| workers[w].has_skill(skill)),
    );
    qualified.or_else(|| least_loaded(&mut (0..workers.len())))
}

/// Least-utilized unit of the required type, or `None` when the wave
/// has no unit of that type.
fn pick_unit(equipment: &[Equipment], unit_minutes: &[f64], required: crate::models::EquipmentType) -> Option<usize> {
    (0..equipment.len())
        .filter(|&u| equipment[u].equipment_type == required)
        .min_by(|&a, &b| {
            unit_minutes[a]
                .partial_cmp(&unit_minutes[b])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::DurationConfig;
    use crate::geometry::{GeometryConfig, GeometryDistanceService};
    use crate::models::{EquipmentType, OrderItem, Skill, Sku};
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    fn durations() -> StageDurationModel {
        let geometry = Arc::new(GeometryDistanceService::new(
            Vec::new(),
            HashMap::new(),
            GeometryConfig::default(),
        ));
        StageDurationModel::new(geometry, DurationConfig::default())
    }

    fn skus() -> HashMap<String, Sku> {
        let mut skus = HashMap::new();
        skus.insert(
            "A".to_string(),
            Sku::new("A", 1).with_pick_time(10.0).with_pack_time(6.0),
        );
        skus
    }

    fn make_order(id: &str, priority: u8, deadline_minutes: i64) -> Order {
        let mut order = Order::new(id, "C1", t0() + ChronoDuration::minutes(deadline_minutes))
            .with_item(OrderItem::new("A", 1))
            .with_priority(priority);
        order.recompute_aggregates(&skus());
        order
    }

    fn full_equipment() -> Vec<Equipment> {
        vec![
            Equipment::new("CART", EquipmentType::PickCart),
            Equipment::new("CONV", EquipmentType::Conveyor).with_capacity(4),
            Equipment::new("PACK", EquipmentType::PackingStation),
            Equipment::new("PRINT", EquipmentType::LabelPrinter),
            Equipment::new("DOCK", EquipmentType::DockDoor),
        ]
    }

    #[test]
    fn test_complete_schedule_for_every_order() {
        let orders = vec![
            make_order("O1", 1, 240),
            make_order("O2", 3, 480),
            make_order("O3", 5, 120),
        ];
        let workers = vec![Worker::new("W1").with_all_skills()];
        let dm = durations();

        let schedules =
            FallbackListScheduler::new(&dm).schedule(&orders, &workers, &full_equipment(), t0());
        assert_eq!(schedules.len(), 3);
        for os in &schedules {
            assert!(os.is_complete());
        }
        // Output stays in input order.
        assert_eq!(schedules[0].order_id, "O1");
        assert_eq!(schedules[2].order_id, "O3");
    }

    #[test]
    fn test_precedence_within_every_order() {
        let orders = vec![make_order("O1", 2, 240), make_order("O2", 2, 240)];
        let workers = vec![
            Worker::new("W1").with_all_skills(),
            Worker::new("W2").with_all_skills(),
        ];
        let dm = durations();

        let schedules =
            FallbackListScheduler::new(&dm).schedule(&orders, &workers, &full_equipment(), t0());
        for os in &schedules {
            for pair in os.stages.windows(2) {
                assert!(pair[1].start >= pair[0].end());
            }
        }
    }

    #[test]
    fn test_single_worker_never_double_booked() {
        let orders = vec![
            make_order("O1", 2, 240),
            make_order("O2", 2, 240),
            make_order("O3", 2, 240),
        ];
        let workers = vec![Worker::new("W1").with_all_skills()];
        let dm = durations();

        let schedules =
            FallbackListScheduler::new(&dm).schedule(&orders, &workers, &full_equipment(), t0());
        let mut intervals: Vec<(DateTime<Utc>, DateTime<Utc>)> = schedules
            .iter()
            .flat_map(|os| os.stages.iter())
            .map(|s| (s.start, s.end()))
            .collect();
        intervals.sort();
        for pair in intervals.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "worker intervals overlap: {pair:?}");
        }
    }

    #[test]
    fn test_priority_then_deadline_ordering() {
        // O2 has the earlier deadline but O1 the higher priority.
        let orders = vec![make_order("O1", 1, 480), make_order("O2", 3, 60)];
        let workers = vec![Worker::new("W1").with_all_skills()];
        let dm = durations();

        let schedules =
            FallbackListScheduler::new(&dm).schedule(&orders, &workers, &full_equipment(), t0());
        let o1_pick = schedules[0].stage(StageType::Pick).unwrap().start;
        let o2_pick = schedules[1].stage(StageType::Pick).unwrap().start;
        assert!(o1_pick < o2_pick);
    }

    #[test]
    fn test_skill_routing_prefers_qualified_worker() {
        let orders = vec![make_order("O1", 2, 240)];
        let workers = vec![
            Worker::new("PACKER").with_skill(Skill::Packing),
            Worker::new("ALL").with_all_skills(),
        ];
        let dm = durations();

        let schedules =
            FallbackListScheduler::new(&dm).schedule(&orders, &workers, &full_equipment(), t0());
        let pack = schedules[0].stage(StageType::Pack).unwrap();
        // Both qualify for pack; PACKER is less loaded because ALL took
        // the pick and consolidate stages first.
        assert_eq!(pack.worker_id.as_deref(), Some("PACKER"));
        // Pick can only go to ALL.
        let pick = schedules[0].stage(StageType::Pick).unwrap();
        assert_eq!(pick.worker_id.as_deref(), Some("ALL"));
    }

    #[test]
    fn test_unqualified_worker_still_assigned() {
        // One worker, no matching skills anywhere: totality requires a
        // complete schedule anyway.
        let orders = vec![make_order("O1", 2, 240)];
        let workers = vec![Worker::new("W1")];
        let dm = durations();

        let schedules =
            FallbackListScheduler::new(&dm).schedule(&orders, &workers, &full_equipment(), t0());
        assert!(schedules[0].is_complete());
        for s in &schedules[0].stages {
            assert_eq!(s.worker_id.as_deref(), Some("W1"));
        }
    }

    #[test]
    fn test_no_workers_no_equipment_still_schedules() {
        let orders = vec![make_order("O1", 2, 240)];
        let dm = durations();

        let schedules = FallbackListScheduler::new(&dm).schedule(&orders, &[], &[], t0());
        assert_eq!(schedules.len(), 1);
        let os = &schedules[0];
        assert!(os.is_complete());
        for s in &os.stages {
            assert!(s.worker_id.is_none());
            assert!(s.equipment_id.is_none());
        }
        // Precedence still chains through the unassigned stages.
        for pair in os.stages.windows(2) {
            assert!(pair[1].start >= pair[0].end());
        }
    }

    #[test]
    fn test_capacity_two_station_hosts_two_concurrent_packs() {
        // Long packs on a worker-free wave so only the station binds.
        let mut skus = HashMap::new();
        skus.insert(
            "SLOW".to_string(),
            Sku::new("SLOW", 1).with_pick_time(2.0).with_pack_time(30.0),
        );
        let mut orders = vec![
            Order::new("O1", "C1", t0() + ChronoDuration::minutes(240))
                .with_item(OrderItem::new("SLOW", 1)),
            Order::new("O2", "C1", t0() + ChronoDuration::minutes(240))
                .with_item(OrderItem::new("SLOW", 1)),
        ];
        for order in &mut orders {
            order.recompute_aggregates(&skus);
        }
        let mut equipment = full_equipment();
        // Replace the single pack station with one capacity-2 station.
        equipment.retain(|e| e.equipment_type != EquipmentType::PackingStation);
        equipment.push(Equipment::new("PACK-BIG", EquipmentType::PackingStation).with_capacity(2));
        let dm = durations();

        let schedules = FallbackListScheduler::new(&dm).schedule(&orders, &[], &equipment, t0());
        let p1 = schedules[0].stage(StageType::Pack).unwrap();
        let p2 = schedules[1].stage(StageType::Pack).unwrap();
        assert_eq!(p1.equipment_id.as_deref(), Some("PACK-BIG"));
        assert_eq!(p2.equipment_id.as_deref(), Some("PACK-BIG"));
        // With two channels the second pack runs while the first is
        // still on the station.
        assert!(p1.start < p2.end() && p2.start < p1.end());
    }

    #[test]
    fn test_efficiency_scales_assigned_duration() {
        let orders = vec![make_order("O1", 2, 240)];
        let fast = vec![Worker::new("FAST").with_all_skills().with_efficiency(2.0)];
        let nominal = vec![Worker::new("NOM").with_all_skills()];
        let dm = durations();

        let fast_pick = FallbackListScheduler::new(&dm)
            .schedule(&orders, &fast, &full_equipment(), t0())[0]
            .stage(StageType::Pick)
            .unwrap()
            .duration_minutes;
        let nominal_pick = FallbackListScheduler::new(&dm)
            .schedule(&orders, &nominal, &full_equipment(), t0())[0]
            .stage(StageType::Pick)
            .unwrap()
            .duration_minutes;
        // Twice the efficiency, half the assigned duration: 10 → 5 min.
        assert!((nominal_pick - 10.0).abs() < 1e-10);
        assert!((fast_pick - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_empty_wave() {
        let dm = durations();
        let schedules = FallbackListScheduler::new(&dm).schedule(&[], &[], &[], t0());
        assert!(schedules.is_empty());
    }
}
