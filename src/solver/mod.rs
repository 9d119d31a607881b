//! Constrained scheduling formulation and solve path.
//!
//! Builds a slot-discretized decision model from one wave's orders and
//! resources, composes the weighted objective, and drives a pluggable
//! solving backend under a hard wall-clock budget.
//!
//! # Pipeline
//!
//! 1. [`ScheduleModelBuilder`] — decision variables and hard
//!    constraints (precedence, worker non-overlap, equipment capacity,
//!    skill eligibility) plus soft deadline slots.
//! 2. [`ObjectiveComposer`] — weighted sum of deadline penalties,
//!    labor cost, equipment cost, makespan, and an idle-equipment term.
//! 3. [`SolverDriver`] — time-boxed solve through a [`SolverBackend`],
//!    returning a first-class status instead of raising on
//!    infeasibility or timeout.
//!
//! The backend seam keeps the solving capability a black box: any
//! CP/MIP/local-search engine can sit behind [`SolverBackend`]. The
//! bundled [`LocalSearchSolver`] uses seeded greedy construction and
//! first-improvement neighborhood search.

mod backend;
mod driver;
mod model;
mod objective;

pub use backend::{DecodedSchedule, LocalSearchSolver, SolveOutcome, SolverBackend};
pub use driver::{SolveResult, SolverDriver};
pub use model::{EquipmentCandidates, ModelBuildError, ScheduleModel, ScheduleModelBuilder, StageVar};
pub use objective::{ObjectiveBreakdown, ObjectiveComposer, ObjectiveWeights};
