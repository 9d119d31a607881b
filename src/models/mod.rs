//! Warehouse scheduling domain models.
//!
//! Provides the core data types for representing one scheduling wave
//! and its solution. All entities are constructed fresh per invocation
//! from externally supplied snapshots and are read-only while a run is
//! in flight.
//!
//! # Entity Roles
//!
//! | Type | Role |
//! |------|------|
//! | `Sku` / `OrderItem` / `Order` | Work to be scheduled |
//! | `Worker` / `Equipment` | Resources stages are assigned to |
//! | `Bin` | Geometry input for walking-time estimation |
//! | `StageType` | The fixed six-stage precedence chain |
//! | `StageSchedule` / `OrderSchedule` | The emitted solution |

mod bin;
mod equipment;
mod order;
mod schedule;
mod sku;
mod stage;
mod worker;

pub use bin::Bin;
pub use equipment::{Equipment, EquipmentType};
pub use order::Order;
pub use schedule::{makespan_minutes, OrderSchedule, SolveStatus, StageSchedule};
pub use sku::{OrderItem, Sku};
pub use stage::StageType;
pub use worker::{Skill, Worker};
