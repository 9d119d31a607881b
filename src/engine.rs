//! Wave orchestration.
//!
//! The engine ties the four scheduling subsystems together for one
//! wave: it validates the snapshots, attempts the constrained path
//! (model → objective → time-boxed solve), and falls back to the
//! guaranteed list scheduler when the model cannot be built or the
//! solve ends without a schedule. The baseline path runs independently
//! for comparison reporting.
//!
//! A wave request never fails outright: every call returns a complete
//! schedule plus a status naming the path that produced it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::baseline::{BaselineOutcome, BaselineSequencer, ReassignmentEvent};
use crate::config::SchedulerConfig;
use crate::duration::StageDurationModel;
use crate::fallback::FallbackListScheduler;
use crate::geometry::GeometryDistanceService;
use crate::metrics::OptimizationMetrics;
use crate::models::{Equipment, Order, OrderSchedule, Sku, SolveStatus, Worker};
use crate::solver::{
    LocalSearchSolver, ObjectiveBreakdown, ObjectiveComposer, ScheduleModelBuilder, SolverBackend,
    SolverDriver,
};
use crate::validation::validate_wave;

/// One wave's snapshots plus optional per-wave overrides of the
/// engine's horizon and budget settings.
#[derive(Debug, Clone)]
pub struct WaveRequest {
    /// Orders to schedule.
    pub orders: Vec<Order>,
    /// Workers available to the wave.
    pub workers: Vec<Worker>,
    /// Equipment available to the wave.
    pub equipment: Vec<Equipment>,
    /// SKU catalog the orders reference.
    pub skus: HashMap<String, Sku>,
    /// Wall-clock time of the horizon's first slot.
    pub reference_start: DateTime<Utc>,
    /// Per-wave slot width override (minutes).
    pub slot_minutes: Option<i64>,
    /// Per-wave horizon override (minutes).
    pub horizon_minutes: Option<i64>,
    /// Per-wave solve budget override (seconds).
    pub solve_time_limit_seconds: Option<u64>,
}

impl WaveRequest {
    /// Creates an empty request starting at the given reference time.
    pub fn new(reference_start: DateTime<Utc>) -> Self {
        Self {
            orders: Vec::new(),
            workers: Vec::new(),
            equipment: Vec::new(),
            skus: HashMap::new(),
            reference_start,
            slot_minutes: None,
            horizon_minutes: None,
            solve_time_limit_seconds: None,
        }
    }

    /// Sets the orders.
    pub fn with_orders(mut self, orders: Vec<Order>) -> Self {
        self.orders = orders;
        self
    }

    /// Sets the workers.
    pub fn with_workers(mut self, workers: Vec<Worker>) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the equipment.
    pub fn with_equipment(mut self, equipment: Vec<Equipment>) -> Self {
        self.equipment = equipment;
        self
    }

    /// Sets the SKU catalog.
    pub fn with_skus(mut self, skus: HashMap<String, Sku>) -> Self {
        self.skus = skus;
        self
    }

    /// Overrides the slot width for this wave.
    pub fn with_slot_minutes(mut self, slot_minutes: i64) -> Self {
        self.slot_minutes = Some(slot_minutes);
        self
    }

    /// Overrides the horizon length for this wave.
    pub fn with_horizon_minutes(mut self, horizon_minutes: i64) -> Self {
        self.horizon_minutes = Some(horizon_minutes);
        self
    }

    /// Overrides the solve budget for this wave.
    pub fn with_time_limit_seconds(mut self, seconds: u64) -> Self {
        self.solve_time_limit_seconds = Some(seconds);
        self
    }
}

/// What one wave invocation produced.
#[derive(Debug)]
pub struct WaveResult {
    /// Which path produced the schedules.
    pub status: SolveStatus,
    /// One schedule per order, in request order.
    pub schedules: Vec<OrderSchedule>,
    /// Aggregate quality numbers for the run.
    pub metrics: OptimizationMetrics,
    /// Objective breakdown, present when the constrained path won.
    pub objective: Option<ObjectiveBreakdown>,
}

/// The baseline comparison run: schedules, the reassignment log, and
/// metrics computed the same way as the optimized path's.
#[derive(Debug)]
pub struct BaselineResult {
    /// One schedule per order, in request order.
    pub schedules: Vec<OrderSchedule>,
    /// Reactive rebalancing events, for comparison reporting only.
    pub reassignments: Vec<ReassignmentEvent>,
    /// Aggregate quality numbers for the baseline run.
    pub metrics: OptimizationMetrics,
}

/// Schedules waves over a shared geometry service.
///
/// One engine instance may serve concurrent waves: each call works on
/// its own snapshots, and the geometry cache is the only shared state.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use std::sync::Arc;
/// use chrono::{TimeZone, Utc};
/// use waveplan::config::SchedulerConfig;
/// use waveplan::engine::{WaveRequest, WaveScheduler};
/// use waveplan::geometry::{GeometryConfig, GeometryDistanceService};
/// use waveplan::models::{Equipment, EquipmentType, Order, OrderItem, Sku, Worker};
///
/// let start = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
/// let mut skus = HashMap::new();
/// skus.insert(
///     "A".to_string(),
///     Sku::new("A", 1).with_pick_time(2.0).with_pack_time(1.0),
/// );
///
/// let geometry = Arc::new(GeometryDistanceService::new(
///     Vec::new(),
///     HashMap::new(),
///     GeometryConfig::default(),
/// ));
/// let scheduler = WaveScheduler::new(geometry, SchedulerConfig::default());
///
/// let request = WaveRequest::new(start)
///     .with_orders(vec![Order::new("O1", "C1", start + chrono::Duration::hours(4))
///         .with_item(OrderItem::new("A", 2))])
///     .with_workers(vec![Worker::new("W1").with_all_skills().with_hourly_rate(22.0)])
///     .with_equipment(vec![
///         Equipment::new("CART", EquipmentType::PickCart),
///         Equipment::new("CONV", EquipmentType::Conveyor).with_capacity(4),
///         Equipment::new("PACK", EquipmentType::PackingStation),
///         Equipment::new("PRINT", EquipmentType::LabelPrinter),
///         Equipment::new("DOCK", EquipmentType::DockDoor),
///     ])
///     .with_skus(skus)
///     .with_time_limit_seconds(5);
///
/// let result = scheduler.schedule_wave(&request);
/// assert_eq!(result.schedules.len(), 1);
/// assert!(result.status.has_schedule());
/// ```
pub struct WaveScheduler {
    geometry: Arc<GeometryDistanceService>,
    config: SchedulerConfig,
    backend: Box<dyn SolverBackend>,
}

impl WaveScheduler {
    /// Creates an engine with the bundled local-search backend.
    pub fn new(geometry: Arc<GeometryDistanceService>, config: SchedulerConfig) -> Self {
        let backend = Box::new(LocalSearchSolver::new(config.solver_seed));
        Self {
            geometry,
            config,
            backend,
        }
    }

    /// Replaces the solving backend.
    pub fn with_backend(mut self, backend: Box<dyn SolverBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// The configuration in effect.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Schedules one wave.
    ///
    /// Attempts the constrained path first; on a model-construction
    /// failure or a solve ending without a schedule, the fallback list
    /// scheduler produces the result instead. Always returns a
    /// complete schedule for every order.
    pub fn schedule_wave(&self, request: &WaveRequest) -> WaveResult {
        let orders = self.prepare_orders(request);
        let durations =
            StageDurationModel::new(Arc::clone(&self.geometry), self.config.duration.clone());

        let slot_minutes = request.slot_minutes.unwrap_or(self.config.slot_minutes);
        let horizon_minutes = request.horizon_minutes.unwrap_or(self.config.horizon_minutes);
        let time_limit = Duration::from_secs(
            request
                .solve_time_limit_seconds
                .unwrap_or(self.config.solve_time_limit_seconds),
        );

        let build = ScheduleModelBuilder::new(
            &orders,
            &request.workers,
            &request.equipment,
            &durations,
            request.reference_start,
        )
        .with_slot_minutes(slot_minutes)
        .with_horizon_minutes(horizon_minutes)
        .build();

        let (status, schedules, objective) = match build {
            Ok(model) => {
                let composer = ObjectiveComposer::new(self.config.objective.clone());
                let driver = SolverDriver::new(self.backend.as_ref());
                let result = driver.solve(&model, &composer, time_limit);
                if result.status.has_schedule() {
                    (result.status, result.schedules, result.objective)
                } else {
                    warn!(
                        status = %result.status,
                        "constrained solve ended without a schedule; taking the fallback scheduler"
                    );
                    self.run_fallback(&orders, request, &durations)
                }
            }
            Err(error) => {
                warn!(%error, "model construction failed; taking the fallback scheduler");
                self.run_fallback(&orders, request, &durations)
            }
        };

        info!(
            status = %status,
            orders = schedules.len(),
            "wave scheduled"
        );

        let metrics = OptimizationMetrics::calculate(
            status,
            &schedules,
            &request.workers,
            &request.equipment,
            request.reference_start,
            self.config.objective.overtime_multiplier,
        );

        WaveResult {
            status,
            schedules,
            metrics,
            objective,
        }
    }

    /// Runs the independent baseline policy over the same wave.
    ///
    /// Not a fallback: this is the intentionally suboptimal incumbent
    /// schedule the optimized result is measured against.
    pub fn baseline_wave(&self, request: &WaveRequest) -> BaselineResult {
        let orders = self.prepare_orders(request);
        let durations =
            StageDurationModel::new(Arc::clone(&self.geometry), self.config.duration.clone());

        let BaselineOutcome { schedules, events } =
            BaselineSequencer::new(&durations, self.config.baseline.clone()).sequence(
                &orders,
                &request.workers,
                &request.equipment,
                &request.skus,
                request.reference_start,
            );

        // The baseline is a heuristic-produced schedule; its metrics
        // report under the same tag as the guaranteed heuristic.
        let metrics = OptimizationMetrics::calculate(
            SolveStatus::Fallback,
            &schedules,
            &request.workers,
            &request.equipment,
            request.reference_start,
            self.config.objective.overtime_multiplier,
        );

        BaselineResult {
            schedules,
            reassignments: events,
            metrics,
        }
    }

    /// Validates the snapshots (logging findings, never rejecting) and
    /// refreshes each order's cached aggregates against the catalog.
    fn prepare_orders(&self, request: &WaveRequest) -> Vec<Order> {
        if let Err(findings) = validate_wave(
            &request.orders,
            &request.workers,
            &request.equipment,
            &request.skus,
            &[],
        ) {
            for finding in &findings {
                warn!(kind = ?finding.kind, "{}", finding.message);
            }
        }

        let mut orders = request.orders.clone();
        for order in &mut orders {
            order.recompute_aggregates(&request.skus);
        }
        orders
    }

    fn run_fallback(
        &self,
        orders: &[Order],
        request: &WaveRequest,
        durations: &StageDurationModel,
    ) -> (SolveStatus, Vec<OrderSchedule>, Option<ObjectiveBreakdown>) {
        let schedules = FallbackListScheduler::new(durations).schedule(
            orders,
            &request.workers,
            &request.equipment,
            request.reference_start,
        );
        (SolveStatus::Fallback, schedules, None)
    }
}
