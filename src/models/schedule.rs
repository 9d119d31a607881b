//! Schedule (solution) model.
//!
//! A wave's solution is one [`OrderSchedule`] per order, each holding
//! one [`StageSchedule`] per stage in precedence order. Stage schedules
//! are immutable once emitted; the order-level completion time, on-time
//! flag, and violation minutes are derived at construction.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::StageType;

/// Which path produced a schedule, or why the constrained path failed.
///
/// `Optimal`..`Timeout` come from the solver driver; `Fallback` is
/// applied by the engine when the guaranteed heuristic produced the
/// result instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// The solver proved or converged on a best-known solution.
    Optimal,
    /// A feasible solution was found within budget, optimality unknown.
    Feasible,
    /// No assignment satisfies the hard constraints within the horizon.
    Infeasible,
    /// The time budget expired with no feasible solution.
    Timeout,
    /// The guaranteed list scheduler produced the result.
    Fallback,
}

impl SolveStatus {
    /// Stable uppercase name for reporting.
    pub fn name(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Timeout => "TIMEOUT",
            SolveStatus::Fallback => "FALLBACK",
        }
    }

    /// Whether this status carries a usable schedule.
    pub fn has_schedule(self) -> bool {
        !matches!(self, SolveStatus::Infeasible | SolveStatus::Timeout)
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One stage of one order: when it runs and who/what runs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSchedule {
    /// Owning order identifier.
    pub order_id: String,
    /// Which stage this is.
    pub stage: StageType,
    /// Wall-clock start time.
    pub start: DateTime<Utc>,
    /// Assigned duration (minutes).
    pub duration_minutes: f64,
    /// Assigned worker, if one was chosen.
    pub worker_id: Option<String>,
    /// Assigned equipment unit, if the stage occupies one.
    pub equipment_id: Option<String>,
}

impl StageSchedule {
    /// Creates a stage schedule.
    pub fn new(
        order_id: impl Into<String>,
        stage: StageType,
        start: DateTime<Utc>,
        duration_minutes: f64,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            stage,
            start,
            duration_minutes,
            worker_id: None,
            equipment_id: None,
        }
    }

    /// Sets the assigned worker.
    pub fn with_worker(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = Some(worker_id.into());
        self
    }

    /// Sets the assigned equipment unit.
    pub fn with_equipment(mut self, equipment_id: impl Into<String>) -> Self {
        self.equipment_id = Some(equipment_id.into());
        self
    }

    /// Wall-clock end time (sub-minute durations land on seconds).
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::seconds((self.duration_minutes * 60.0).round() as i64)
    }
}

/// The complete schedule for one order: all six stages plus the derived
/// deadline outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSchedule {
    /// Owning order identifier.
    pub order_id: String,
    /// Stage schedules in precedence order.
    pub stages: Vec<StageSchedule>,
    /// Completion time of the final stage.
    pub completion_time: DateTime<Utc>,
    /// Whether the order ships by its deadline.
    pub on_time: bool,
    /// Minutes past the deadline (0 when on time).
    pub deadline_violation_minutes: f64,
}

impl OrderSchedule {
    /// Builds an order schedule and derives the deadline outcome.
    ///
    /// `stages` must already be in precedence order; the completion time
    /// is the latest stage end.
    pub fn from_stages(
        order_id: impl Into<String>,
        stages: Vec<StageSchedule>,
        deadline: DateTime<Utc>,
    ) -> Self {
        let completion_time = stages.iter().map(|s| s.end()).max().unwrap_or(deadline);
        let late_seconds = (completion_time - deadline).num_seconds().max(0);
        Self {
            order_id: order_id.into(),
            stages,
            completion_time,
            on_time: late_seconds == 0,
            deadline_violation_minutes: late_seconds as f64 / 60.0,
        }
    }

    /// Finds the schedule for a given stage.
    pub fn stage(&self, stage: StageType) -> Option<&StageSchedule> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Whether every stage in the enumeration is present.
    pub fn is_complete(&self) -> bool {
        StageType::ALL.iter().all(|&s| self.stage(s).is_some())
    }
}

/// Makespan over a set of order schedules: minutes from `reference_start`
/// to the latest stage end. Empty input yields 0.
pub fn makespan_minutes(schedules: &[OrderSchedule], reference_start: DateTime<Utc>) -> f64 {
    schedules
        .iter()
        .flat_map(|os| os.stages.iter())
        .map(|s| (s.end() - reference_start).num_seconds())
        .max()
        .map(|secs| secs as f64 / 60.0)
        .unwrap_or(0.0)
}
