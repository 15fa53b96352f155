//! Core model for laboratory-protocol execution
//!
//! This crate provides the protocol graph, the token and execution-record
//! structures, and the error taxonomy that all other components depend on.
//! It contains no engine logic.

mod error;
mod graph;
mod material;
mod record;
mod token;
mod value;

pub use error::{FiringError, GraphError, LabError, MaterialError};
pub use graph::{
    ActivityNode, Behavior, BehaviorId, Edge, EdgeId, EdgeKind, NodeId, ParamId, Parameter,
    ParameterDirection, Protocol,
};
pub use material::{aggregate_materials, sum_measures, Material, Measure};
pub use record::{
    ActivityNodeExecution, Agent, BehaviorCall, ParameterValue, ProtocolExecution, RecordId, RunId,
};
pub use token::{Token, TokenId};
pub use value::Literal;

/// Result type for protocol-execution operations
pub type Result<T> = std::result::Result<T, LabError>;
