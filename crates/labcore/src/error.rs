use crate::graph::{BehaviorId, EdgeId, NodeId, ParamId};
use crate::record::RecordId;
use crate::token::TokenId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabError {
    #[error("firing error: {0}")]
    Firing(#[from] FiringError),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("material error: {0}")]
    Material(#[from] MaterialError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Structural violations raised while firing a node; all of these abort the run
#[derive(Error, Debug, Clone)]
pub enum FiringError {
    #[error("initial node {node} must have zero inputs, but had {count}")]
    InitialNodeArity { node: NodeId, count: usize },

    #[error("fork node {node} must have precisely one input, but had {count}")]
    ForkNodeArity { node: NodeId, count: usize },

    #[error("pin {node} must have precisely one input, but had {count}")]
    PinArity { node: NodeId, count: usize },

    #[error("output parameter node {node} expects precisely one object flow input, but had {count}")]
    OutputParameterArity { node: NodeId, count: usize },

    #[error("do not know how to execute node {node} of kind {kind}")]
    UnsupportedNode { node: NodeId, kind: String },

    #[error("no value bound for parameter '{name}'")]
    MissingParameterValue { name: String },

    #[error("primitive '{behavior}' failed: {message}")]
    Primitive { behavior: String, message: String },
}

/// Failed identity lookups and malformed graph structure
#[derive(Error, Debug, Clone)]
pub enum GraphError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("unknown edge: {0}")]
    UnknownEdge(EdgeId),

    #[error("unknown behavior: {0}")]
    UnknownBehavior(BehaviorId),

    #[error("unknown parameter: {0}")]
    UnknownParameter(ParamId),

    #[error("action {action} has no input pin named '{name}'")]
    UnknownPin { action: NodeId, name: String },

    #[error("node {0} is not a call behavior action")]
    NotAnAction(NodeId),

    #[error("node {node} referenced as a pin of action {action} is not a pin")]
    NotAPin { action: NodeId, node: NodeId },

    #[error("unknown execution record: {0}")]
    UnknownRecord(RecordId),

    #[error("unknown token: {0}")]
    UnknownToken(TokenId),

    #[error("edge {0} references a node that is not in the protocol")]
    DanglingEdge(EdgeId),

    #[error("protocol graph contains a cycle; node revisiting is not supported")]
    CyclicProtocol,
}

#[derive(Error, Debug, Clone)]
pub enum MaterialError {
    #[error("can only merge measures with identical units and kinds: {left} vs {right}")]
    IncompatibleMeasures { left: String, right: String },

    #[error("cannot sum an empty list of measures")]
    Empty,
}
