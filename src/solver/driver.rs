//! Time-boxed solve and solution extraction.
//!
//! The driver is the caller-facing end of the constrained path: it
//! hands the model to a backend under a hard wall-clock budget, then
//! converts the slot-level solution back into wall-clock
//! [`StageSchedule`]s. Infeasibility and timeout come back as status
//! values the caller branches on — the driver never raises for them,
//! and never blocks past the budget.

use std::time::{Duration, Instant};

use chrono::Duration as ChronoDuration;
use tracing::{debug, warn};

use super::backend::{DecodedSchedule, SolverBackend};
use super::model::ScheduleModel;
use super::objective::{ObjectiveBreakdown, ObjectiveComposer};
use crate::models::{OrderSchedule, SolveStatus, StageSchedule, StageType};

/// Outcome of one constrained solve.
///
/// `schedules` is empty exactly when the status carries no schedule
/// (`Infeasible` or `Timeout`); the caller is expected to take the
/// fallback scheduler in that case.
#[derive(Debug)]
pub struct SolveResult {
    /// Terminal solver status.
    pub status: SolveStatus,
    /// One schedule per order, in model order.
    pub schedules: Vec<OrderSchedule>,
    /// Objective of the returned schedule, when one exists.
    pub objective: Option<ObjectiveBreakdown>,
}

/// Drives a [`SolverBackend`] and extracts wall-clock schedules.
pub struct SolverDriver<'a> {
    backend: &'a dyn SolverBackend,
}

impl<'a> SolverDriver<'a> {
    /// Creates a driver over a backend.
    pub fn new(backend: &'a dyn SolverBackend) -> Self {
        Self { backend }
    }

    /// Solves the model within the wall-clock budget.
    ///
    /// Synchronous and blocking; always returns by roughly the budget's
    /// expiry. On `Optimal` or `Feasible` the slot-level solution is
    /// converted to timestamps via the model's reference start and slot
    /// width.
    pub fn solve(
        &self,
        model: &ScheduleModel,
        composer: &ObjectiveComposer,
        time_limit: Duration,
    ) -> SolveResult {
        let started = Instant::now();
        let outcome = self.backend.solve(model, composer, time_limit);
        let elapsed = started.elapsed();

        debug!(
            backend = self.backend.name(),
            status = %outcome.status,
            elapsed_ms = elapsed.as_millis() as u64,
            "constrained solve finished"
        );

        match outcome.decoded {
            Some(decoded) if outcome.status.has_schedule() => SolveResult {
                status: outcome.status,
                schedules: extract_schedules(model, &decoded),
                objective: outcome.objective,
            },
            _ => {
                warn!(
                    backend = self.backend.name(),
                    status = %outcome.status,
                    "constrained solve produced no schedule"
                );
                SolveResult {
                    status: outcome.status,
                    schedules: Vec::new(),
                    objective: None,
                }
            }
        }
    }
}

/// Converts a slot-level solution into wall-clock order schedules.
fn extract_schedules(model: &ScheduleModel, decoded: &DecodedSchedule) -> Vec<OrderSchedule> {
    let mut schedules = Vec::with_capacity(model.orders.len());

    for (order_idx, order) in model.orders.iter().enumerate() {
        let mut stages = Vec::with_capacity(StageType::ALL.len());

        for stage in StageType::ALL {
            let vi = model.var_index(order_idx, stage);
            let var = &model.stage_vars[vi];
            let start = model.reference_start
                + ChronoDuration::minutes(decoded.start_slots[vi] * model.slot_minutes);

            let mut schedule = StageSchedule::new(&order.id, stage, start, var.duration_minutes)
                .with_worker(&model.workers[decoded.workers[vi]].id);
            if let Some(unit_idx) = decoded.equipment[vi] {
                schedule = schedule.with_equipment(&model.equipment[unit_idx].id);
            }
            stages.push(schedule);
        }

        schedules.push(OrderSchedule::from_stages(
            &order.id,
            stages,
            order.shipping_deadline,
        ));
    }

    schedules
}
