//! Schedule quality metrics.
//!
//! Aggregates counts, costs, and percentages over one run's order
//! schedules. Always derived from the schedules themselves — never
//! stored as an independent source of truth.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan | Minutes from reference start to the latest stage end |
//! | On-time percentage | Orders shipping by their deadline |
//! | Total labor cost | Assigned hours × rate, overtime multiplied |
//! | Total equipment cost | Assigned hours × unit hourly cost |
//! | Deadline violation | Sum of minutes past deadlines |
//! | Equipment utilization | Busy minutes / (makespan × capacity) |

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{makespan_minutes, Equipment, OrderSchedule, SolveStatus, Worker};

/// Aggregate quality numbers for one scheduling run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationMetrics {
    /// Which path produced the measured schedule.
    pub solver_status: SolveStatus,
    /// Orders in the run.
    pub order_count: usize,
    /// Orders shipping by their deadline.
    pub on_time_count: usize,
    /// On-time orders as a percentage (100.0 for an empty run).
    pub on_time_percentage: f64,
    /// Labor cost over all assigned stage durations, with the overtime
    /// multiplier applied beyond each worker's daily limit.
    pub total_labor_cost: f64,
    /// Equipment cost over all assigned stage durations.
    pub total_equipment_cost: f64,
    /// Sum of minutes past deadlines across late orders.
    pub total_deadline_violation_minutes: f64,
    /// Minutes from the reference start to the latest stage end.
    pub makespan_minutes: f64,
    /// Mean utilization over the equipment snapshot.
    pub avg_equipment_utilization: f64,
    /// Per-unit utilization (busy minutes over makespan × capacity).
    pub utilization_by_equipment: HashMap<String, f64>,
}

impl OptimizationMetrics {
    /// Computes metrics over a run's schedules.
    ///
    /// `overtime_multiplier` matches the objective's labor term so the
    /// reported cost and the optimized cost agree.
    pub fn calculate(
        solver_status: SolveStatus,
        schedules: &[OrderSchedule],
        workers: &[Worker],
        equipment: &[Equipment],
        reference_start: DateTime<Utc>,
        overtime_multiplier: f64,
    ) -> Self {
        let order_count = schedules.len();
        let on_time_count = schedules.iter().filter(|os| os.on_time).count();
        let total_deadline_violation_minutes = schedules
            .iter()
            .map(|os| os.deadline_violation_minutes)
            .sum();
        let makespan = makespan_minutes(schedules, reference_start);

        // Labor: accumulate assigned minutes per worker, then split
        // into regular and overtime hours.
        let mut worker_assigned: HashMap<&str, f64> = HashMap::new();
        for stage in schedules.iter().flat_map(|os| os.stages.iter()) {
            if let Some(worker_id) = stage.worker_id.as_deref() {
                *worker_assigned.entry(worker_id).or_insert(0.0) += stage.duration_minutes;
            }
        }
        let mut total_labor_cost = 0.0;
        for worker in workers {
            let minutes = worker_assigned.get(worker.id.as_str()).copied().unwrap_or(0.0);
            let hours = minutes / 60.0;
            let regular = hours.min(worker.max_hours_per_day);
            let overtime = (hours - worker.max_hours_per_day).max(0.0);
            total_labor_cost += (regular + overtime * overtime_multiplier) * worker.hourly_rate;
        }

        // Equipment: cost per assigned hour, busy minutes per unit.
        let mut unit_busy: HashMap<&str, f64> = HashMap::new();
        for stage in schedules.iter().flat_map(|os| os.stages.iter()) {
            if let Some(equipment_id) = stage.equipment_id.as_deref() {
                *unit_busy.entry(equipment_id).or_insert(0.0) += stage.duration_minutes;
            }
        }
        let mut total_equipment_cost = 0.0;
        let mut utilization_by_equipment = HashMap::with_capacity(equipment.len());
        for unit in equipment {
            let busy = unit_busy.get(unit.id.as_str()).copied().unwrap_or(0.0);
            total_equipment_cost += busy / 60.0 * unit.hourly_cost;
            let utilization = if makespan > 0.0 {
                (busy / (makespan * unit.capacity.max(1) as f64)).min(1.0)
            } else {
                0.0
            };
            utilization_by_equipment.insert(unit.id.clone(), utilization);
        }
        let avg_equipment_utilization = if utilization_by_equipment.is_empty() {
            0.0
        } else {
            utilization_by_equipment.values().sum::<f64>()
                / utilization_by_equipment.len() as f64
        };

        let on_time_percentage = if order_count == 0 {
            100.0
        } else {
            on_time_count as f64 / order_count as f64 * 100.0
        };

        Self {
            solver_status,
            order_count,
            on_time_count,
            on_time_percentage,
            total_labor_cost,
            total_equipment_cost,
            total_deadline_violation_minutes,
            makespan_minutes: makespan,
            avg_equipment_utilization,
            utilization_by_equipment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EquipmentType, StageSchedule, StageType};
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    fn make_schedule(
        order_id: &str,
        offset_minutes: i64,
        stage_minutes: f64,
        deadline_minutes: i64,
    ) -> OrderSchedule {
        let stages = StageType::ALL
            .iter()
            .enumerate()
            .map(|(i, &stage)| {
                let start =
                    t0() + ChronoDuration::minutes(offset_minutes + i as i64 * stage_minutes as i64);
                let mut s = StageSchedule::new(order_id, stage, start, stage_minutes)
                    .with_worker("W1");
                if stage == StageType::Pack {
                    s = s.with_equipment("PACK");
                }
                s
            })
            .collect();
        OrderSchedule::from_stages(
            order_id,
            stages,
            t0() + ChronoDuration::minutes(deadline_minutes),
        )
    }

    fn sample_workers() -> Vec<Worker> {
        vec![Worker::new("W1").with_hourly_rate(30.0).with_max_hours(8.0)]
    }

    fn sample_equipment() -> Vec<Equipment> {
        vec![
            Equipment::new("PACK", EquipmentType::PackingStation).with_hourly_cost(12.0),
            Equipment::new("IDLE", EquipmentType::DockDoor).with_hourly_cost(50.0),
        ]
    }

    #[test]
    fn test_on_time_and_violation() {
        // First order completes at 60 min against a 90 min deadline;
        // second completes at 120 min against a 60 min deadline.
        let schedules = vec![
            make_schedule("O1", 0, 10.0, 90),
            make_schedule("O2", 60, 10.0, 60),
        ];
        let metrics = OptimizationMetrics::calculate(
            SolveStatus::Optimal,
            &schedules,
            &sample_workers(),
            &sample_equipment(),
            t0(),
            1.5,
        );

        assert_eq!(metrics.order_count, 2);
        assert_eq!(metrics.on_time_count, 1);
        assert!((metrics.on_time_percentage - 50.0).abs() < 1e-10);
        // O2 is 60 minutes late.
        assert!((metrics.total_deadline_violation_minutes - 60.0).abs() < 1e-10);
        assert!((metrics.makespan_minutes - 120.0).abs() < 1e-10);
        assert_eq!(metrics.solver_status, SolveStatus::Optimal);
    }

    #[test]
    fn test_labor_cost_regular_hours() {
        // 12 stages × 10 min = 120 min = 2 h at $30, under the 8 h limit.
        let schedules = vec![
            make_schedule("O1", 0, 10.0, 600),
            make_schedule("O2", 60, 10.0, 600),
        ];
        let metrics = OptimizationMetrics::calculate(
            SolveStatus::Feasible,
            &schedules,
            &sample_workers(),
            &sample_equipment(),
            t0(),
            1.5,
        );
        assert!((metrics.total_labor_cost - 60.0).abs() < 1e-10);
    }

    #[test]
    fn test_labor_cost_overtime() {
        // 6 stages × 100 min = 600 min = 10 h: 8 regular + 2 overtime.
        let schedules = vec![make_schedule("O1", 0, 100.0, 6000)];
        let metrics = OptimizationMetrics::calculate(
            SolveStatus::Fallback,
            &schedules,
            &sample_workers(),
            &sample_equipment(),
            t0(),
            1.5,
        );
        // (8 + 2 × 1.5) × 30 = 330.
        assert!((metrics.total_labor_cost - 330.0).abs() < 1e-10);
    }

    #[test]
    fn test_equipment_cost_and_utilization() {
        // Pack runs 10 min on PACK ($12/h): cost 2.0. IDLE never used.
        let schedules = vec![make_schedule("O1", 0, 10.0, 600)];
        let metrics = OptimizationMetrics::calculate(
            SolveStatus::Optimal,
            &schedules,
            &sample_workers(),
            &sample_equipment(),
            t0(),
            1.5,
        );
        assert!((metrics.total_equipment_cost - 2.0).abs() < 1e-10);
        // Makespan 60 min; PACK busy 10 min → 1/6 utilization.
        assert!((metrics.utilization_by_equipment["PACK"] - 10.0 / 60.0).abs() < 1e-10);
        assert!((metrics.utilization_by_equipment["IDLE"] - 0.0).abs() < 1e-10);
        assert!((metrics.avg_equipment_utilization - 10.0 / 120.0).abs() < 1e-10);
    }

    #[test]
    fn test_empty_run() {
        let metrics = OptimizationMetrics::calculate(
            SolveStatus::Optimal,
            &[],
            &sample_workers(),
            &sample_equipment(),
            t0(),
            1.5,
        );
        assert_eq!(metrics.order_count, 0);
        assert!((metrics.on_time_percentage - 100.0).abs() < 1e-10);
        assert!((metrics.total_labor_cost - 0.0).abs() < 1e-10);
        assert!((metrics.makespan_minutes - 0.0).abs() < 1e-10);
        assert!((metrics.avg_equipment_utilization - 0.0).abs() < 1e-10);
    }
}
