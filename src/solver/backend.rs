//! Solving backends.
//!
//! The solving capability is a black box behind [`SolverBackend`]: it
//! receives the decision model and the objective composer, and returns
//! a status plus the best decoded schedule it found inside the budget.
//! Any CP/MIP/local-search engine can implement the trait; the bundled
//! [`LocalSearchSolver`] searches over a permutation-plus-assignment
//! encoding with a serial decoder, the classic list-scheduling
//! formulation.
//!
//! # Encoding
//!
//! A candidate is an order permutation plus one worker choice and one
//! equipment choice per (order, stage) variable. The decoder walks the
//! permutation, placing each order's stages at the earliest slot where
//! the chosen worker is free and the chosen unit is below capacity —
//! so every decoded schedule satisfies the hard constraints by
//! construction, and the objective alone ranks candidates.

use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::model::ScheduleModel;
use super::objective::{ObjectiveBreakdown, ObjectiveComposer};
use crate::models::{SolveStatus, StageType};

const IMPROVEMENT_EPS: f64 = 1e-9;

/// A schedule decoded from a candidate: slot-level starts and resource
/// assignments, one entry per stage variable.
#[derive(Debug, Clone)]
pub struct DecodedSchedule {
    /// Start slot per stage variable.
    pub start_slots: Vec<i64>,
    /// Assigned worker index per stage variable.
    pub workers: Vec<usize>,
    /// Assigned equipment index per stage variable, where the stage
    /// occupies equipment.
    pub equipment: Vec<Option<usize>>,
    /// Per order: slot at which its ship stage completes.
    pub ship_completion_slots: Vec<i64>,
    /// Makespan in minutes (latest stage end × slot width).
    pub makespan_minutes: f64,
}

/// What a backend produced within its budget.
#[derive(Debug)]
pub struct SolveOutcome {
    /// Terminal status. Never `Fallback`; that tag belongs to the
    /// engine.
    pub status: SolveStatus,
    /// Best decoded schedule, present for `Optimal`/`Feasible`.
    pub decoded: Option<DecodedSchedule>,
    /// Objective of the best schedule.
    pub objective: Option<ObjectiveBreakdown>,
}

impl SolveOutcome {
    fn failed(status: SolveStatus) -> Self {
        Self {
            status,
            decoded: None,
            objective: None,
        }
    }
}

/// A constraint-solving capability.
///
/// Implementations must honor the budget as a hard wall-clock bound
/// and always return; infeasibility and timeout are status values,
/// never panics or errors.
pub trait SolverBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Searches for a schedule within the wall-clock budget.
    fn solve(
        &self,
        model: &ScheduleModel,
        composer: &ObjectiveComposer,
        budget: Duration,
    ) -> SolveOutcome;
}

/// One point in the search space: an order permutation plus per-variable
/// resource choices (indices into each variable's candidate lists,
/// applied modulo the list length so every vector is decodable).
#[derive(Debug, Clone)]
struct Candidate {
    sequence: Vec<usize>,
    worker_choice: Vec<usize>,
    equipment_choice: Vec<usize>,
}

/// Seeded greedy construction plus first-improvement local search.
///
/// Reports `Optimal` only when a complete neighborhood sweep finds no
/// improving move inside the budget (a converged local optimum),
/// `Feasible` when the budget expires while an incumbent exists,
/// `Timeout` when it expires with none, and `Infeasible` when no
/// candidate fits the horizon.
#[derive(Debug, Clone)]
pub struct LocalSearchSolver {
    seed: u64,
    initial_candidates: usize,
}

impl LocalSearchSolver {
    /// Creates a solver with the given RNG seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            initial_candidates: 8,
        }
    }

    /// Sets how many randomized starting candidates to construct.
    pub fn with_initial_candidates(mut self, count: usize) -> Self {
        self.initial_candidates = count.max(1);
        self
    }

    /// Deterministic earliest-deadline-first seed candidate with
    /// least-loaded resource choices.
    fn edf_candidate(&self, model: &ScheduleModel) -> Candidate {
        let mut sequence: Vec<usize> = (0..model.orders.len()).collect();
        sequence.sort_by(|&a, &b| {
            let oa = &model.orders[a];
            let ob = &model.orders[b];
            (oa.priority, model.deadline_slots[a], &oa.id).cmp(&(
                ob.priority,
                model.deadline_slots[b],
                &ob.id,
            ))
        });

        let mut worker_minutes = vec![0.0_f64; model.workers.len()];
        let mut unit_minutes = vec![0.0_f64; model.equipment.len()];
        let mut worker_choice = vec![0usize; model.var_count()];
        let mut equipment_choice = vec![0usize; model.var_count()];

        // Walk variables in the decode order so the load trackers see
        // assignments in the same sequence the decoder will.
        for &order_idx in &sequence {
            for stage in StageType::ALL {
                let vi = model.var_index(order_idx, stage);
                let var = &model.stage_vars[vi];

                if !var.candidate_workers.is_empty() {
                    let (best, _) = var
                        .candidate_workers
                        .iter()
                        .enumerate()
                        .map(|(choice, &w)| (choice, worker_minutes[w]))
                        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                        .unwrap_or((0, 0.0));
                    worker_choice[vi] = best;
                    worker_minutes[var.candidate_workers[best]] += var.duration_minutes;
                }

                if let Some(eq) = &var.equipment {
                    let (best, _) = eq
                        .units
                        .iter()
                        .enumerate()
                        .map(|(choice, &u)| (choice, unit_minutes[u]))
                        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                        .unwrap_or((0, 0.0));
                    equipment_choice[vi] = best;
                    unit_minutes[eq.units[best]] += var.duration_minutes;
                }
            }
        }

        Candidate {
            sequence,
            worker_choice,
            equipment_choice,
        }
    }

    fn random_candidate(&self, model: &ScheduleModel, rng: &mut SmallRng) -> Candidate {
        let mut sequence: Vec<usize> = (0..model.orders.len()).collect();
        sequence.shuffle(rng);
        let worker_choice = model
            .stage_vars
            .iter()
            .map(|v| {
                if v.candidate_workers.is_empty() {
                    0
                } else {
                    rng.random_range(0..v.candidate_workers.len())
                }
            })
            .collect();
        let equipment_choice = model
            .stage_vars
            .iter()
            .map(|v| match &v.equipment {
                Some(eq) if !eq.units.is_empty() => rng.random_range(0..eq.units.len()),
                _ => 0,
            })
            .collect();
        Candidate {
            sequence,
            worker_choice,
            equipment_choice,
        }
    }
}

impl SolverBackend for LocalSearchSolver {
    fn name(&self) -> &'static str {
        "local-search"
    }

    fn solve(
        &self,
        model: &ScheduleModel,
        composer: &ObjectiveComposer,
        budget: Duration,
    ) -> SolveOutcome {
        let deadline = Instant::now() + budget;

        if model.var_count() == 0 {
            // An empty wave is trivially optimal.
            let decoded = DecodedSchedule {
                start_slots: Vec::new(),
                workers: Vec::new(),
                equipment: Vec::new(),
                ship_completion_slots: Vec::new(),
                makespan_minutes: 0.0,
            };
            let objective = composer.evaluate(model, &decoded);
            return SolveOutcome {
                status: SolveStatus::Optimal,
                decoded: Some(decoded),
                objective: Some(objective),
            };
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut best: Option<(Candidate, DecodedSchedule, ObjectiveBreakdown)> = None;

        // Construction: the deterministic EDF candidate plus a small
        // randomized pool.
        let mut starts = vec![self.edf_candidate(model)];
        for _ in 1..self.initial_candidates {
            starts.push(self.random_candidate(model, &mut rng));
        }

        for candidate in starts {
            if Instant::now() >= deadline {
                break;
            }
            if let Some(decoded) = decode(model, &candidate) {
                let objective = composer.evaluate(model, &decoded);
                let better = best
                    .as_ref()
                    .map(|(_, _, b)| objective.total() < b.total() - IMPROVEMENT_EPS)
                    .unwrap_or(true);
                if better {
                    best = Some((candidate, decoded, objective));
                }
            }
        }

        let Some((mut candidate, mut decoded, mut objective)) = best else {
            return if Instant::now() >= deadline {
                SolveOutcome::failed(SolveStatus::Timeout)
            } else {
                debug!("no candidate fits the horizon");
                SolveOutcome::failed(SolveStatus::Infeasible)
            };
        };

        // First-improvement sweeps until converged or out of time.
        let status = loop {
            let mut improved = false;

            let neighbors: Vec<Candidate> = neighborhood(model, &candidate).collect();
            for neighbor in neighbors {
                if Instant::now() >= deadline {
                    break;
                }
                if let Some(n_decoded) = decode(model, &neighbor) {
                    let n_objective = composer.evaluate(model, &n_decoded);
                    if n_objective.total() < objective.total() - IMPROVEMENT_EPS {
                        candidate = neighbor;
                        decoded = n_decoded;
                        objective = n_objective;
                        improved = true;
                        break;
                    }
                }
            }

            if Instant::now() >= deadline {
                break SolveStatus::Feasible;
            }
            if !improved {
                // A full sweep with no improving move: converged.
                break SolveStatus::Optimal;
            }
        };

        SolveOutcome {
            status,
            decoded: Some(decoded),
            objective: Some(objective),
        }
    }
}

/// Deterministic neighborhood enumeration: adjacent permutation swaps,
/// then alternative worker choices, then alternative equipment choices.
fn neighborhood<'a>(
    model: &'a ScheduleModel,
    candidate: &'a Candidate,
) -> impl Iterator<Item = Candidate> + 'a {
    let swaps = (0..candidate.sequence.len().saturating_sub(1)).map(move |i| {
        let mut next = candidate.clone();
        next.sequence.swap(i, i + 1);
        next
    });

    let workers = model.stage_vars.iter().enumerate().flat_map(move |(vi, var)| {
        let current = if var.candidate_workers.is_empty() {
            0
        } else {
            candidate.worker_choice[vi] % var.candidate_workers.len()
        };
        (0..var.candidate_workers.len())
            .filter(move |&alt| alt != current)
            .map(move |alt| {
                let mut next = candidate.clone();
                next.worker_choice[vi] = alt;
                next
            })
    });

    let equipment = model.stage_vars.iter().enumerate().flat_map(move |(vi, var)| {
        let units = var.equipment.as_ref().map(|eq| eq.units.len()).unwrap_or(0);
        let current = if units == 0 {
            0
        } else {
            candidate.equipment_choice[vi] % units
        };
        (0..units).filter(move |&alt| alt != current).map(move |alt| {
            let mut next = candidate.clone();
            next.equipment_choice[vi] = alt;
            next
        })
    });

    swaps.chain(workers).chain(equipment)
}

/// Serial decoder: places each order's stages, in permutation order, at
/// the earliest slot where the chosen worker is free and the chosen
/// unit is below capacity. Returns `None` when any stage cannot fit
/// inside the horizon — the infeasibility signal.
fn decode(model: &ScheduleModel, candidate: &Candidate) -> Option<DecodedSchedule> {
    let n_slots = model.horizon_slots.max(0) as usize;
    let mut worker_busy = vec![vec![false; n_slots]; model.workers.len()];
    let mut unit_load = vec![vec![0u32; n_slots]; model.equipment.len()];

    let mut start_slots = vec![0_i64; model.var_count()];
    let mut workers = vec![0_usize; model.var_count()];
    let mut equipment = vec![None; model.var_count()];
    let mut ship_completion_slots = vec![0_i64; model.orders.len()];
    let mut last_end = 0_i64;

    for &order_idx in &candidate.sequence {
        let mut prev_end = 0_i64;

        for stage in StageType::ALL {
            let vi = model.var_index(order_idx, stage);
            let var = &model.stage_vars[vi];
            if var.candidate_workers.is_empty() {
                return None;
            }
            let worker = var.candidate_workers
                [candidate.worker_choice[vi] % var.candidate_workers.len()];
            let unit = match &var.equipment {
                Some(eq) if !eq.units.is_empty() => {
                    Some(eq.units[candidate.equipment_choice[vi] % eq.units.len()])
                }
                Some(_) => return None,
                None => None,
            };

            let d = var.duration_slots;
            let latest_start = model.horizon_slots - d;
            let mut start = prev_end;

            'scan: loop {
                if start > latest_start {
                    return None;
                }
                for t in start..start + d {
                    let slot = t as usize;
                    if worker_busy[worker][slot] {
                        start = t + 1;
                        continue 'scan;
                    }
                    if let Some(u) = unit {
                        if unit_load[u][slot] >= model.equipment[u].capacity {
                            start = t + 1;
                            continue 'scan;
                        }
                    }
                }
                break;
            }

            for t in start..start + d {
                let slot = t as usize;
                worker_busy[worker][slot] = true;
                if let Some(u) = unit {
                    unit_load[u][slot] += 1;
                }
            }

            start_slots[vi] = start;
            workers[vi] = worker;
            equipment[vi] = unit;
            prev_end = start + d;
        }

        ship_completion_slots[order_idx] = prev_end;
        last_end = last_end.max(prev_end);
    }

    Some(DecodedSchedule {
        start_slots,
        workers,
        equipment,
        ship_completion_slots,
        makespan_minutes: (last_end * model.slot_minutes) as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::{DurationConfig, StageDurationModel};
    use crate::geometry::{GeometryConfig, GeometryDistanceService};
    use crate::models::{Equipment, EquipmentType, Order, OrderItem, Sku, Worker};
    use crate::solver::model::ScheduleModelBuilder;
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
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
            Sku::new("A", 1).with_pick_time(10.0).with_pack_time(12.0),
        );
        skus
    }

    fn make_order(id: &str, deadline_minutes: i64) -> Order {
        let mut order = Order::new(id, "C1", t0() + ChronoDuration::minutes(deadline_minutes))
            .with_item(OrderItem::new("A", 1));
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

    fn build_model(orders: &[Order], workers: &[Worker], horizon_minutes: i64) -> ScheduleModel {
        let equipment = full_equipment();
        let dm = durations();
        ScheduleModelBuilder::new(orders, workers, &equipment, &dm, t0())
            .with_horizon_minutes(horizon_minutes)
            .build()
            .unwrap()
    }

    fn solve(model: &ScheduleModel) -> SolveOutcome {
        let composer = ObjectiveComposer::default();
        LocalSearchSolver::new(42).solve(model, &composer, Duration::from_secs(5))
    }

    #[test]
    fn test_single_order_is_optimal_and_on_time() {
        let orders = vec![make_order("O1", 240)];
        let workers = vec![Worker::new("W1").with_all_skills().with_hourly_rate(20.0)];
        let model = build_model(&orders, &workers, 24 * 60);

        let outcome = solve(&model);
        assert_eq!(outcome.status, SolveStatus::Optimal);
        let decoded = outcome.decoded.unwrap();
        // All six stages scheduled sequentially for the one worker.
        for order_vars in 0..1 {
            let base = order_vars * 6;
            for i in base..base + 5 {
                let end = decoded.start_slots[i] + model.stage_vars[i].duration_slots;
                assert!(decoded.start_slots[i + 1] >= end);
            }
        }
        // Ship completes before the 4-hour deadline (slot 16).
        assert!(decoded.ship_completion_slots[0] <= model.deadline_slots[0]);
        assert_eq!(outcome.objective.unwrap().missed_orders, 0);
    }

    #[test]
    fn test_worker_never_double_booked() {
        let orders = vec![
            make_order("O1", 480),
            make_order("O2", 480),
            make_order("O3", 480),
        ];
        let workers = vec![
            Worker::new("W1").with_all_skills().with_hourly_rate(20.0),
            Worker::new("W2").with_all_skills().with_hourly_rate(18.0),
        ];
        let model = build_model(&orders, &workers, 24 * 60);

        let decoded = solve(&model).decoded.unwrap();
        // Rebuild per-worker occupancy from the decoded starts; any
        // slot counted twice is a double-booking.
        let mut busy = vec![vec![0u32; model.horizon_slots as usize]; workers.len()];
        for (vi, var) in model.stage_vars.iter().enumerate() {
            for t in decoded.start_slots[vi]..decoded.start_slots[vi] + var.duration_slots {
                busy[decoded.workers[vi]][t as usize] += 1;
            }
        }
        for worker_slots in busy {
            for count in worker_slots {
                assert!(count <= 1);
            }
        }
    }

    #[test]
    fn test_single_pack_station_serializes() {
        let orders: Vec<Order> = (0..6).map(|i| make_order(&format!("O{i}"), 600)).collect();
        let workers: Vec<Worker> = (0..6)
            .map(|i| {
                Worker::new(format!("W{i}"))
                    .with_all_skills()
                    .with_hourly_rate(20.0)
            })
            .collect();
        let model = build_model(&orders, &workers, 24 * 60);

        let decoded = solve(&model).decoded.unwrap();
        // One packing station with capacity 1: no two pack intervals
        // may overlap.
        let mut pack_intervals: Vec<(i64, i64)> = Vec::new();
        for (vi, var) in model.stage_vars.iter().enumerate() {
            if var.stage == StageType::Pack {
                pack_intervals
                    .push((decoded.start_slots[vi], decoded.start_slots[vi] + var.duration_slots));
            }
        }
        pack_intervals.sort();
        for pair in pack_intervals.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "pack stages overlap: {pair:?}");
        }
    }

    #[test]
    fn test_conveyor_capacity_allows_concurrency() {
        let orders: Vec<Order> = (0..4).map(|i| make_order(&format!("O{i}"), 600)).collect();
        let workers: Vec<Worker> = (0..4)
            .map(|i| {
                Worker::new(format!("W{i}"))
                    .with_all_skills()
                    .with_hourly_rate(20.0)
            })
            .collect();
        let model = build_model(&orders, &workers, 24 * 60);

        let decoded = solve(&model).decoded.unwrap();
        // Capacity 4 conveyor: concurrent consolidate loads ≤ 4.
        let mut load = vec![0u32; model.horizon_slots as usize];
        for (vi, var) in model.stage_vars.iter().enumerate() {
            if var.stage == StageType::Consolidate {
                for t in decoded.start_slots[vi]..decoded.start_slots[vi] + var.duration_slots {
                    load[t as usize] += 1;
                }
            }
        }
        assert!(load.into_iter().all(|c| c <= 4));
    }

    #[test]
    fn test_horizon_too_short_is_infeasible() {
        let orders = vec![make_order("O1", 240)];
        let workers = vec![Worker::new("W1").with_all_skills().with_hourly_rate(20.0)];
        // Six stages need six slots minimum; give the horizon two.
        let model = build_model(&orders, &workers, 30);

        let outcome = solve(&model);
        assert_eq!(outcome.status, SolveStatus::Infeasible);
        assert!(outcome.decoded.is_none());
    }

    #[test]
    fn test_past_deadline_still_scheduled_and_missed() {
        let orders = vec![make_order("O1", -120)];
        let workers = vec![Worker::new("W1").with_all_skills().with_hourly_rate(20.0)];
        let model = build_model(&orders, &workers, 24 * 60);
        assert_eq!(model.deadline_slots[0], 0);

        let outcome = solve(&model);
        assert!(outcome.status.has_schedule());
        // Scheduled, but the deadline penalty registers the miss.
        assert_eq!(outcome.objective.unwrap().missed_orders, 1);
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let orders: Vec<Order> = (0..5).map(|i| make_order(&format!("O{i}"), 480)).collect();
        let workers = vec![
            Worker::new("W1").with_all_skills().with_hourly_rate(20.0),
            Worker::new("W2").with_all_skills().with_hourly_rate(25.0),
        ];
        let model = build_model(&orders, &workers, 24 * 60);
        let composer = ObjectiveComposer::default();

        let a = LocalSearchSolver::new(7).solve(&model, &composer, Duration::from_secs(5));
        let b = LocalSearchSolver::new(7).solve(&model, &composer, Duration::from_secs(5));
        assert_eq!(a.status, b.status);
        let (oa, ob) = (a.objective.unwrap(), b.objective.unwrap());
        assert!((oa.total() - ob.total()).abs() < 1e-9);
    }

    #[test]
    fn test_empty_wave_is_trivially_optimal() {
        let model = build_model(&[], &[], 24 * 60);
        let outcome = solve(&model);
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.decoded.unwrap().start_slots.len(), 0);
    }

    #[test]
    fn test_zero_budget_times_out_without_incumbent() {
        let orders = vec![make_order("O1", 240)];
        let workers = vec![Worker::new("W1").with_all_skills().with_hourly_rate(20.0)];
        let model = build_model(&orders, &workers, 24 * 60);
        let composer = ObjectiveComposer::default();

        let outcome =
            LocalSearchSolver::new(1).solve(&model, &composer, Duration::from_secs(0));
        assert_eq!(outcome.status, SolveStatus::Timeout);
    }
}
