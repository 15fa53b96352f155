//! Token-flow execution runtime
//!
//! This crate provides the engine that runs protocol activity graphs: the
//! time source, the enablement evaluator, the per-node-kind dispatcher, the
//! primitive registry, and specialization observers.

mod clock;
mod dispatch;
mod enablement;
mod engine;
mod registry;
mod specialize;
mod validation;

pub use clock::{ordinal_epoch, ClockMode, ExecutionClock};
pub use enablement::{enabled_activity_node, executable_nodes, token_target};
pub use engine::ExecutionEngine;
pub use registry::{PlaceholderPrimitive, Primitive, PrimitiveRegistry};
pub use specialize::{BehaviorSpecialization, DefaultBehaviorSpecialization};
pub use validation::validate_protocol;
