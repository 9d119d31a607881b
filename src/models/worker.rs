//! Worker model.
//!
//! Workers are the human resources stages are assigned to. A worker's
//! skill set is drawn from the closed [`Skill`] enumeration, so an
//! unknown skill is a type error rather than a silent runtime mismatch.
//! Worker snapshots are read-only for the duration of one scheduling run.

use serde::{Deserialize, Serialize};

/// A warehouse skill from the fixed enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    Picking,
    Packing,
    Shipping,
    Labeling,
    Consolidation,
    Staging,
}

impl Skill {
    /// All skills, in stage-precedence-companion order.
    pub const ALL: [Skill; 6] = [
        Skill::Picking,
        Skill::Consolidation,
        Skill::Packing,
        Skill::Labeling,
        Skill::Staging,
        Skill::Shipping,
    ];

    /// Stable lowercase name for logs and exports.
    pub fn name(self) -> &'static str {
        match self {
            Skill::Picking => "picking",
            Skill::Packing => "packing",
            Skill::Shipping => "shipping",
            Skill::Labeling => "labeling",
            Skill::Consolidation => "consolidation",
            Skill::Staging => "staging",
        }
    }
}

impl std::fmt::Display for Skill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A worker available to the wave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    /// Unique worker identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Skills this worker holds.
    pub skills: Vec<Skill>,
    /// Labor cost per hour.
    pub hourly_rate: f64,
    /// Work rate multiplier (1.0 = nominal, >1.0 = faster).
    pub efficiency_factor: f64,
    /// Hours per day before overtime rates apply.
    pub max_hours_per_day: f64,
}

impl Worker {
    /// Creates a worker with no skills and nominal efficiency.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            skills: Vec::new(),
            hourly_rate: 0.0,
            efficiency_factor: 1.0,
            max_hours_per_day: 8.0,
        }
    }

    /// Sets the worker name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a skill.
    pub fn with_skill(mut self, skill: Skill) -> Self {
        if !self.skills.contains(&skill) {
            self.skills.push(skill);
        }
        self
    }

    /// Adds every skill in the enumeration.
    pub fn with_all_skills(mut self) -> Self {
        self.skills = Skill::ALL.to_vec();
        self
    }

    /// Sets the hourly rate.
    pub fn with_hourly_rate(mut self, rate: f64) -> Self {
        self.hourly_rate = rate;
        self
    }

    /// Sets the efficiency factor (floored at a small positive value).
    pub fn with_efficiency(mut self, factor: f64) -> Self {
        self.efficiency_factor = factor.max(0.01);
        self
    }

    /// Sets the regular-hours limit per day.
    pub fn with_max_hours(mut self, hours: f64) -> Self {
        self.max_hours_per_day = hours;
        self
    }

    /// Whether this worker holds the given skill.
    pub fn has_skill(&self, skill: Skill) -> bool {
        self.skills.contains(&skill)
    }
}
