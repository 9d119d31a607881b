//! Multi-term objective composition.
//!
//! Scores a decoded schedule as a weighted sum of deadline-violation
//! penalties, labor cost, equipment cost, makespan, and a small
//! idle-equipment term. Every weight is a named configuration value;
//! the deadline term dominates by construction so deadline compliance
//! is optimized first among equally feasible alternatives.

use serde::{Deserialize, Serialize};

use super::backend::DecodedSchedule;
use super::model::ScheduleModel;

/// Named objective weights. Defaults make one missed deadline on a
/// lowest-priority order (1 × 1000) outweigh any plausible cost
/// difference between schedules of the same wave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    /// Base penalty per missed deadline, before priority and customer
    /// multipliers. The dominant term.
    pub deadline_base_penalty: f64,
    /// Deadline multiplier for premium customers.
    pub premium_customer_multiplier: f64,
    /// Labor-rate multiplier for hours beyond a worker's daily limit.
    pub overtime_multiplier: f64,
    /// Cost per makespan minute.
    pub makespan_weight_per_minute: f64,
    /// Multiplier on total labor cost.
    pub labor_weight: f64,
    /// Multiplier on total equipment cost.
    pub equipment_weight: f64,
    /// Weight of the idle-equipment term. Low by design: it breaks
    /// ties without competing with cost or deadline terms.
    pub utilization_weight: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            deadline_base_penalty: 1000.0,
            premium_customer_multiplier: 2.0,
            overtime_multiplier: 1.5,
            makespan_weight_per_minute: 2.0,
            labor_weight: 1.0,
            equipment_weight: 1.0,
            utilization_weight: 2.0,
        }
    }
}

impl ObjectiveWeights {
    /// Deadline weight for a priority level: priority 1 (highest)
    /// weighs 5, priority 5 weighs 1.
    pub fn priority_weight(priority: u8) -> f64 {
        (6 - priority.clamp(1, 5)) as f64
    }
}

/// Per-term objective values for one schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectiveBreakdown {
    /// Σ missed × priority weight × customer weight × base penalty.
    pub deadline_penalty: f64,
    /// Labor cost with overtime applied (weighted).
    pub labor_cost: f64,
    /// Equipment cost (weighted).
    pub equipment_cost: f64,
    /// Makespan term.
    pub makespan_cost: f64,
    /// Idle-equipment term.
    pub utilization_penalty: f64,
    /// Number of orders missing their deadline.
    pub missed_orders: usize,
}

impl ObjectiveBreakdown {
    /// The scalar the solver minimizes.
    pub fn total(&self) -> f64 {
        self.deadline_penalty
            + self.labor_cost
            + self.equipment_cost
            + self.makespan_cost
            + self.utilization_penalty
    }
}

/// Composes the scalar objective over a model's decoded schedules.
#[derive(Debug, Clone, Default)]
pub struct ObjectiveComposer {
    weights: ObjectiveWeights,
}

impl ObjectiveComposer {
    /// Creates a composer with the given weights.
    pub fn new(weights: ObjectiveWeights) -> Self {
        Self { weights }
    }

    /// The weights in effect.
    pub fn weights(&self) -> &ObjectiveWeights {
        &self.weights
    }

    /// Evaluates a decoded schedule.
    pub fn evaluate(&self, model: &ScheduleModel, decoded: &DecodedSchedule) -> ObjectiveBreakdown {
        let w = &self.weights;
        let mut breakdown = ObjectiveBreakdown::default();

        // Deadline violations: the soft constraint lands here, not in
        // the feasibility check.
        for (order_idx, order) in model.orders.iter().enumerate() {
            if decoded.ship_completion_slots[order_idx] > model.deadline_slots[order_idx] {
                let customer_weight = if order.premium {
                    w.premium_customer_multiplier
                } else {
                    1.0
                };
                breakdown.deadline_penalty += ObjectiveWeights::priority_weight(order.priority)
                    * customer_weight
                    * w.deadline_base_penalty;
                breakdown.missed_orders += 1;
            }
        }

        // Labor: accumulate minutes per worker, then split the total
        // into regular and overtime hours.
        let mut worker_minutes = vec![0.0_f64; model.workers.len()];
        for (var_idx, var) in model.stage_vars.iter().enumerate() {
            worker_minutes[decoded.workers[var_idx]] += var.duration_minutes;
        }
        for (worker_idx, &minutes) in worker_minutes.iter().enumerate() {
            let worker = &model.workers[worker_idx];
            let hours = minutes / 60.0;
            let regular = hours.min(worker.max_hours_per_day);
            let overtime = (hours - worker.max_hours_per_day).max(0.0);
            breakdown.labor_cost +=
                (regular + overtime * w.overtime_multiplier) * worker.hourly_rate;
        }
        breakdown.labor_cost *= w.labor_weight;

        // Equipment: straight duration × hourly cost per claimed unit.
        let mut unit_minutes = vec![0.0_f64; model.equipment.len()];
        for (var_idx, var) in model.stage_vars.iter().enumerate() {
            if let Some(unit_idx) = decoded.equipment[var_idx] {
                let unit = &model.equipment[unit_idx];
                breakdown.equipment_cost += var.duration_minutes / 60.0 * unit.hourly_cost;
                unit_minutes[unit_idx] += var.duration_minutes;
            }
        }
        breakdown.equipment_cost *= w.equipment_weight;

        breakdown.makespan_cost = decoded.makespan_minutes * w.makespan_weight_per_minute;

        // Idle-equipment term: claimed-but-idle units cost a little, so
        // spreading work over many units loses ties against
        // concentrating it.
        if decoded.makespan_minutes > 0.0 {
            for &minutes in unit_minutes.iter().filter(|&&m| m > 0.0) {
                let utilization = (minutes / decoded.makespan_minutes).min(1.0);
                breakdown.utilization_penalty += w.utilization_weight * (1.0 - utilization);
            }
        }

        breakdown
    }
}
