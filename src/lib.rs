//! Warehouse wave scheduling engine.
//!
//! Assigns each order in a wave to the six processing stages — pick,
//! consolidate, pack, label, stage, ship — binding every stage to a
//! qualified worker and, where required, a capacity-limited equipment
//! unit, under precedence, capacity, skill, and shipping-deadline
//! constraints, while minimizing a weighted mix of makespan, labor
//! cost, equipment cost, and deadline penalties.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Order`, `Sku`, `Worker`,
//!   `Equipment`, `Bin`, `StageType`, `StageSchedule`, `OrderSchedule`
//! - **`geometry`**: Walking-time estimation from bin coordinates
//! - **`duration`**: Per-(order, stage) duration derivation
//! - **`solver`**: Constrained model, objective, and time-boxed solve
//! - **`fallback`**: Guaranteed-result greedy list scheduler
//! - **`baseline`**: Deliberately naive comparison sequencer
//! - **`metrics`**: Aggregate quality numbers per run
//! - **`validation`**: Input integrity checks (duplicate IDs, SKU refs)
//! - **`config`**: Every tunable constant in one place
//! - **`engine`**: Wave orchestration and the fallback branch
//!
//! # Architecture
//!
//! The engine tries the constrained path first (model → objective →
//! solve under a wall-clock budget) and falls back to the list
//! scheduler when the model cannot be built or the solve ends without
//! a schedule, so a wave request always returns a complete schedule
//! plus the status of the path that produced it. The baseline
//! sequencer runs independently to quantify what the optimization is
//! worth.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - de Koster et al. (2007), "Design and control of warehouse order
//!   picking: A literature review"

pub mod baseline;
pub mod config;
pub mod duration;
pub mod engine;
pub mod fallback;
pub mod geometry;
pub mod metrics;
pub mod models;
pub mod solver;
pub mod validation;
