//! Decision model construction.
//!
//! Discretizes the planning horizon into fixed-width slots and builds,
//! per (order, stage), the decision variables a backend searches over:
//! a start slot, a worker chosen from the qualified candidates, and —
//! for stages that occupy equipment — a unit of the mapped type.
//!
//! Hard constraints are structural: the precedence chain follows
//! [`StageType::ALL`]; worker non-overlap and per-unit equipment
//! capacity are enforced by the decoder against the candidate lists
//! built here. The shipping deadline is soft: it becomes a
//! horizon-relative slot index feeding the objective, so a late order
//! can never make the whole wave unsolvable.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

use crate::duration::StageDurationModel;
use crate::models::{Equipment, EquipmentType, Order, StageType, Worker};

/// Structural failure while building the model. Fatal for the
/// constrained path; the engine reacts by taking the fallback
/// scheduler instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelBuildError {
    /// The wave has orders but no workers at all.
    #[error("no workers supplied for the wave")]
    NoWorkers,
    /// A required equipment type has no units in the wave snapshot.
    #[error("no {equipment_type} available for stage {stage}")]
    NoEquipment {
        stage: StageType,
        equipment_type: EquipmentType,
    },
}

/// Equipment candidates for one stage variable.
#[derive(Debug, Clone)]
pub struct EquipmentCandidates {
    /// The type the stage occupies.
    pub equipment_type: EquipmentType,
    /// Indices into the model's equipment snapshot, all of the type.
    pub units: Vec<usize>,
}

/// One (order, stage) decision variable bundle.
#[derive(Debug, Clone)]
pub struct StageVar {
    /// Index into the model's order snapshot.
    pub order_idx: usize,
    /// Which stage this variable schedules.
    pub stage: StageType,
    /// Duration rounded up to whole slots (≥ 1).
    pub duration_slots: i64,
    /// Duration in minutes as derived (pre-rounding).
    pub duration_minutes: f64,
    /// Indices of workers eligible for this stage.
    pub candidate_workers: Vec<usize>,
    /// Equipment candidates, when the stage occupies equipment.
    pub equipment: Option<EquipmentCandidates>,
    /// True when no worker held the mapped skill and eligibility was
    /// relaxed to every worker.
    pub skill_relaxed: bool,
    /// True when the duration came from a degraded default.
    pub degraded: bool,
}

/// The complete decision model for one wave.
///
/// Stage variables are laid out order-major: the six variables of
/// order `i` occupy indices `6 * i .. 6 * i + 6` in stage order.
#[derive(Debug, Clone)]
pub struct ScheduleModel {
    /// Slot width (minutes).
    pub slot_minutes: i64,
    /// Number of slots in the horizon.
    pub horizon_slots: i64,
    /// Wall-clock time of slot 0.
    pub reference_start: DateTime<Utc>,
    /// Order snapshot.
    pub orders: Vec<Order>,
    /// Worker snapshot.
    pub workers: Vec<Worker>,
    /// Equipment snapshot.
    pub equipment: Vec<Equipment>,
    /// Decision variables, order-major in stage order.
    pub stage_vars: Vec<StageVar>,
    /// Per order: deadline as a horizon-relative slot index, clamped
    /// into `0..=horizon_slots`.
    pub deadline_slots: Vec<i64>,
    /// Per order: true when the deadline slot had to be clamped
    /// (at-risk order).
    pub deadline_clamped: Vec<bool>,
}

impl ScheduleModel {
    /// Index of the variable for (order, stage).
    pub fn var_index(&self, order_idx: usize, stage: StageType) -> usize {
        order_idx * StageType::ALL.len() + stage.index()
    }

    /// The six variables of one order, in stage order.
    pub fn vars_for_order(&self, order_idx: usize) -> &[StageVar] {
        let n = StageType::ALL.len();
        &self.stage_vars[order_idx * n..(order_idx + 1) * n]
    }

    /// Total variable count.
    pub fn var_count(&self) -> usize {
        self.stage_vars.len()
    }
}

/// Builds a [`ScheduleModel`] from one wave's snapshots.
pub struct ScheduleModelBuilder<'a> {
    orders: &'a [Order],
    workers: &'a [Worker],
    equipment: &'a [Equipment],
    durations: &'a StageDurationModel,
    reference_start: DateTime<Utc>,
    slot_minutes: i64,
    horizon_minutes: i64,
}

impl<'a> ScheduleModelBuilder<'a> {
    /// Creates a builder with the default 15-minute slots over a 24 h
    /// horizon.
    pub fn new(
        orders: &'a [Order],
        workers: &'a [Worker],
        equipment: &'a [Equipment],
        durations: &'a StageDurationModel,
        reference_start: DateTime<Utc>,
    ) -> Self {
        Self {
            orders,
            workers,
            equipment,
            durations,
            reference_start,
            slot_minutes: 15,
            horizon_minutes: 24 * 60,
        }
    }

    /// Sets the slot granularity (minutes, floored at 1).
    pub fn with_slot_minutes(mut self, slot_minutes: i64) -> Self {
        self.slot_minutes = slot_minutes.max(1);
        self
    }

    /// Sets the horizon length (minutes, floored at one slot).
    pub fn with_horizon_minutes(mut self, horizon_minutes: i64) -> Self {
        self.horizon_minutes = horizon_minutes.max(self.slot_minutes);
        self
    }

    /// Builds the decision model.
    ///
    /// Fails only on structural problems (no workers, missing
    /// equipment type); per-order data issues degrade durations but
    /// never abort the build.
    pub fn build(&self) -> Result<ScheduleModel, ModelBuildError> {
        if !self.orders.is_empty() && self.workers.is_empty() {
            return Err(ModelBuildError::NoWorkers);
        }

        // Equipment index by type, checked up front so a missing type
        // is one clean error instead of a half-built model.
        if !self.orders.is_empty() {
            for stage in StageType::ALL {
                if let Some(required) = stage.equipment_type() {
                    if !self.equipment.iter().any(|e| e.equipment_type == required) {
                        return Err(ModelBuildError::NoEquipment {
                            stage,
                            equipment_type: required,
                        });
                    }
                }
            }
        }

        let horizon_slots = self.horizon_minutes / self.slot_minutes;
        let mut stage_vars = Vec::with_capacity(self.orders.len() * StageType::ALL.len());
        let mut deadline_slots = Vec::with_capacity(self.orders.len());
        let mut deadline_clamped = Vec::with_capacity(self.orders.len());

        for (order_idx, order) in self.orders.iter().enumerate() {
            for stage in StageType::ALL {
                let duration = self.durations.duration(order, stage);
                let duration_slots =
                    ((duration.minutes / self.slot_minutes as f64).ceil() as i64).max(1);

                let candidate_workers = self.qualified_workers(stage);
                let skill_relaxed = candidate_workers.is_empty();
                let candidate_workers = if skill_relaxed {
                    warn!(
                        stage = %stage,
                        skill = %stage.required_skill(),
                        "no worker holds the mapped skill; relaxing eligibility to any worker"
                    );
                    (0..self.workers.len()).collect()
                } else {
                    candidate_workers
                };

                let equipment = stage.equipment_type().map(|equipment_type| {
                    EquipmentCandidates {
                        equipment_type,
                        units: self
                            .equipment
                            .iter()
                            .enumerate()
                            .filter(|(_, e)| e.equipment_type == equipment_type)
                            .map(|(i, _)| i)
                            .collect(),
                    }
                });

                stage_vars.push(StageVar {
                    order_idx,
                    stage,
                    duration_slots,
                    duration_minutes: duration.minutes,
                    candidate_workers,
                    equipment,
                    skill_relaxed,
                    degraded: duration.degraded,
                });
            }

            let (slot, clamped) = self.deadline_slot(order, horizon_slots);
            if clamped {
                warn!(
                    order_id = %order.id,
                    deadline = %order.shipping_deadline,
                    "deadline outside the horizon; clamped and flagged at-risk"
                );
            }
            deadline_slots.push(slot);
            deadline_clamped.push(clamped);
        }

        Ok(ScheduleModel {
            slot_minutes: self.slot_minutes,
            horizon_slots,
            reference_start: self.reference_start,
            orders: self.orders.to_vec(),
            workers: self.workers.to_vec(),
            equipment: self.equipment.to_vec(),
            stage_vars,
            deadline_slots,
            deadline_clamped,
        })
    }

    fn qualified_workers(&self, stage: StageType) -> Vec<usize> {
        let skill = stage.required_skill();
        self.workers
            .iter()
            .enumerate()
            .filter(|(_, w)| w.has_skill(skill))
            .map(|(i, _)| i)
            .collect()
    }

    /// Converts the shipping deadline into a horizon-relative slot,
    /// clamping into `0..=horizon_slots` when it falls outside.
    fn deadline_slot(&self, order: &Order, horizon_slots: i64) -> (i64, bool) {
        let minutes = (order.shipping_deadline - self.reference_start).num_minutes();
        let raw = minutes.div_euclid(self.slot_minutes);
        if raw < 0 {
            (0, true)
        } else if raw > horizon_slots {
            (horizon_slots, true)
        } else {
            (raw, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::DurationConfig;
    use crate::geometry::{GeometryConfig, GeometryDistanceService};
    use crate::models::{OrderItem, Skill, Sku};
    use chrono::{Duration, TimeZone};
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
            Sku::new("A", 1).with_pick_time(10.0).with_pack_time(5.0),
        );
        skus
    }

    fn make_order(id: &str, deadline_minutes: i64) -> Order {
        let mut order = Order::new(id, "C1", t0() + Duration::minutes(deadline_minutes))
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

    fn skilled_worker(id: &str) -> Worker {
        Worker::new(id).with_all_skills().with_hourly_rate(20.0)
    }

    #[test]
    fn test_build_variable_layout() {
        let orders = vec![make_order("O1", 240), make_order("O2", 240)];
        let workers = vec![skilled_worker("W1")];
        let equipment = full_equipment();
        let dm = durations();
        let model = ScheduleModelBuilder::new(&orders, &workers, &equipment, &dm, t0())
            .build()
            .unwrap();

        assert_eq!(model.var_count(), 12);
        assert_eq!(model.horizon_slots, 96); // 1440 / 15
        let pack = &model.stage_vars[model.var_index(1, StageType::Pack)];
        assert_eq!(pack.order_idx, 1);
        assert_eq!(pack.stage, StageType::Pack);
        // Pack = 5.0 min → 1 slot.
        assert_eq!(pack.duration_slots, 1);
    }

    #[test]
    fn test_no_workers_is_fatal() {
        let orders = vec![make_order("O1", 240)];
        let equipment = full_equipment();
        let dm = durations();
        let err = ScheduleModelBuilder::new(&orders, &[], &equipment, &dm, t0())
            .build()
            .unwrap_err();
        assert_eq!(err, ModelBuildError::NoWorkers);
    }

    #[test]
    fn test_missing_equipment_type_is_fatal() {
        let orders = vec![make_order("O1", 240)];
        let workers = vec![skilled_worker("W1")];
        // Everything but a packing station.
        let equipment: Vec<Equipment> = full_equipment()
            .into_iter()
            .filter(|e| e.equipment_type != EquipmentType::PackingStation)
            .collect();
        let dm = durations();
        let err = ScheduleModelBuilder::new(&orders, &workers, &equipment, &dm, t0())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ModelBuildError::NoEquipment {
                stage: StageType::Pack,
                equipment_type: EquipmentType::PackingStation,
            }
        );
    }

    #[test]
    fn test_empty_wave_builds_empty_model() {
        let dm = durations();
        let model = ScheduleModelBuilder::new(&[], &[], &[], &dm, t0())
            .build()
            .unwrap();
        assert_eq!(model.var_count(), 0);
    }

    #[test]
    fn test_skill_eligibility() {
        let orders = vec![make_order("O1", 240)];
        let workers = vec![
            Worker::new("PICKER").with_skill(Skill::Picking),
            skilled_worker("ALL"),
        ];
        let equipment = full_equipment();
        let dm = durations();
        let model = ScheduleModelBuilder::new(&orders, &workers, &equipment, &dm, t0())
            .build()
            .unwrap();

        let pick = &model.stage_vars[model.var_index(0, StageType::Pick)];
        assert_eq!(pick.candidate_workers, vec![0, 1]);
        assert!(!pick.skill_relaxed);

        // Only ALL can pack.
        let pack = &model.stage_vars[model.var_index(0, StageType::Pack)];
        assert_eq!(pack.candidate_workers, vec![1]);
    }

    #[test]
    fn test_skill_relaxation_when_nobody_qualifies() {
        let orders = vec![make_order("O1", 240)];
        // A worker with no skills at all.
        let workers = vec![Worker::new("W1")];
        let equipment = full_equipment();
        let dm = durations();
        let model = ScheduleModelBuilder::new(&orders, &workers, &equipment, &dm, t0())
            .build()
            .unwrap();

        for var in &model.stage_vars {
            assert!(var.skill_relaxed);
            assert_eq!(var.candidate_workers, vec![0]);
        }
    }

    #[test]
    fn test_equipment_candidates_by_type() {
        let orders = vec![make_order("O1", 240)];
        let workers = vec![skilled_worker("W1")];
        let mut equipment = full_equipment();
        equipment.push(Equipment::new("PACK-2", EquipmentType::PackingStation));
        let dm = durations();
        let model = ScheduleModelBuilder::new(&orders, &workers, &equipment, &dm, t0())
            .build()
            .unwrap();

        let pack = &model.stage_vars[model.var_index(0, StageType::Pack)];
        let cands = pack.equipment.as_ref().unwrap();
        assert_eq!(cands.equipment_type, EquipmentType::PackingStation);
        assert_eq!(cands.units.len(), 2);

        // Staging occupies no equipment.
        let staging = &model.stage_vars[model.var_index(0, StageType::Stage)];
        assert!(staging.equipment.is_none());
    }

    #[test]
    fn test_deadline_slot_conversion() {
        let orders = vec![make_order("O1", 240)];
        let workers = vec![skilled_worker("W1")];
        let equipment = full_equipment();
        let dm = durations();
        let model = ScheduleModelBuilder::new(&orders, &workers, &equipment, &dm, t0())
            .build()
            .unwrap();
        // 240 minutes / 15 = slot 16, inside the horizon.
        assert_eq!(model.deadline_slots[0], 16);
        assert!(!model.deadline_clamped[0]);
    }

    #[test]
    fn test_deadline_before_start_clamps_to_zero() {
        let orders = vec![make_order("O1", -60)];
        let workers = vec![skilled_worker("W1")];
        let equipment = full_equipment();
        let dm = durations();
        let model = ScheduleModelBuilder::new(&orders, &workers, &equipment, &dm, t0())
            .build()
            .unwrap();
        assert_eq!(model.deadline_slots[0], 0);
        assert!(model.deadline_clamped[0]);
    }

    #[test]
    fn test_deadline_beyond_horizon_clamps_to_last_slot() {
        let orders = vec![make_order("O1", 3 * 24 * 60)];
        let workers = vec![skilled_worker("W1")];
        let equipment = full_equipment();
        let dm = durations();
        let model = ScheduleModelBuilder::new(&orders, &workers, &equipment, &dm, t0())
            .build()
            .unwrap();
        assert_eq!(model.deadline_slots[0], model.horizon_slots);
        assert!(model.deadline_clamped[0]);
    }
}
