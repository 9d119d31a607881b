//! Processing stage enumeration.
//!
//! Every order passes through the same six stages in a fixed order.
//! The enum's declaration order defines the precedence chain; the
//! skill and equipment mapping tables below are the single source of
//! truth for resource eligibility — unmapped combinations cannot be
//! expressed, so there is no runtime string matching to go wrong.

use serde::{Deserialize, Serialize};

use super::{EquipmentType, Skill};

/// One of the six sequential processing stages an order passes through.
///
/// The declaration order is the precedence order: a stage may not start
/// before its predecessor (for the same order) has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StageType {
    /// Items are retrieved from their bins.
    Pick,
    /// Picked items are brought together into one unit.
    Consolidate,
    /// The consolidated order is packed for shipment.
    Pack,
    /// Shipping labels are printed and applied.
    Label,
    /// The packed order is moved to the staging area.
    Stage,
    /// The order leaves through a dock door.
    Ship,
}

impl StageType {
    /// All stages in precedence order.
    pub const ALL: [StageType; 6] = [
        StageType::Pick,
        StageType::Consolidate,
        StageType::Pack,
        StageType::Label,
        StageType::Stage,
        StageType::Ship,
    ];

    /// Position in the precedence chain (0-indexed).
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&s| s == self).unwrap_or(0)
    }

    /// The stage that must complete before this one, if any.
    pub fn predecessor(self) -> Option<StageType> {
        let idx = self.index();
        if idx == 0 {
            None
        } else {
            Some(Self::ALL[idx - 1])
        }
    }

    /// The skill a worker must hold to be assigned to this stage.
    pub fn required_skill(self) -> Skill {
        match self {
            StageType::Pick => Skill::Picking,
            StageType::Consolidate => Skill::Consolidation,
            StageType::Pack => Skill::Packing,
            StageType::Label => Skill::Labeling,
            StageType::Stage => Skill::Staging,
            StageType::Ship => Skill::Shipping,
        }
    }

    /// The equipment type this stage occupies, if any.
    ///
    /// Staging needs only floor space, which is not a capacity-limited
    /// resource in this model.
    pub fn equipment_type(self) -> Option<EquipmentType> {
        match self {
            StageType::Pick => Some(EquipmentType::PickCart),
            StageType::Consolidate => Some(EquipmentType::Conveyor),
            StageType::Pack => Some(EquipmentType::PackingStation),
            StageType::Label => Some(EquipmentType::LabelPrinter),
            StageType::Stage => None,
            StageType::Ship => Some(EquipmentType::DockDoor),
        }
    }

    /// Stable lowercase name for logs and exports.
    pub fn name(self) -> &'static str {
        match self {
            StageType::Pick => "pick",
            StageType::Consolidate => "consolidate",
            StageType::Pack => "pack",
            StageType::Label => "label",
            StageType::Stage => "stage",
            StageType::Ship => "ship",
        }
    }
}

impl std::fmt::Display for StageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
