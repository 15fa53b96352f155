use crate::graph::{NodeId, ParamId, Protocol};
use crate::material::{aggregate_materials, Material};
use crate::token::{Token, TokenId};
use crate::value::Literal;
use crate::{GraphError, MaterialError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RecordId = Uuid;
pub type RunId = Uuid;

/// Identity of whoever (or whatever) invoked the protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: Uuid,
    pub name: String,
}

impl Agent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// A value bound to a declared parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterValue {
    pub parameter: ParamId,
    pub value: Literal,
}

impl ParameterValue {
    pub fn new(parameter: ParamId, value: Literal) -> Self {
        Self { parameter, value }
    }
}

/// Record of a single behavior invocation made by a call action.
///
/// Firing is modeled as instantaneous at the engine level, so start and end
/// are stamped back to back; elapsed behavior duration is the primitive
/// library's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorCall {
    pub id: Uuid,
    pub name: String,
    /// Inputs bound at call time, outputs appended after firing; kept in
    /// declared parameter order
    pub parameter_values: Vec<ParameterValue>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub completed_normally: bool,
    pub consumed_materials: Vec<Material>,
}

/// Record of one node firing: the node, the tokens it consumed, and (for
/// call behavior actions) the behavior invocation it made
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityNodeExecution {
    pub id: RecordId,
    pub node: NodeId,
    pub incoming: Vec<TokenId>,
    pub call: Option<BehaviorCall>,
}

/// Top-level, replayable record of one protocol run.
///
/// Created once at execution start, owns everything produced during the run,
/// and sealed (end time, completion flag, aggregated materials) only after
/// the fire loop terminates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolExecution {
    pub id: RunId,
    pub protocol: Uuid,
    pub protocol_name: String,
    pub agent: Agent,
    /// Ordered sequence of all node firings
    pub executions: Vec<ActivityNodeExecution>,
    /// Full token history, consumed and not
    pub flows: Vec<Token>,
    /// Protocol-level bindings: inputs supplied by the caller, outputs
    /// accumulated during the run
    pub parameter_values: Vec<ParameterValue>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub completed_normally: bool,
    /// Consumed materials rolled up from child calls
    pub consumed_materials: Vec<Material>,
}

impl ProtocolExecution {
    pub fn new(id: RunId, protocol: &Protocol, agent: Agent) -> Self {
        Self {
            id,
            protocol: protocol.id,
            protocol_name: protocol.name.clone(),
            agent,
            executions: Vec::new(),
            flows: Vec::new(),
            parameter_values: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
            completed_normally: false,
            consumed_materials: Vec::new(),
        }
    }

    pub fn token(&self, id: TokenId) -> Result<&Token, GraphError> {
        self.flows
            .iter()
            .find(|t| t.id == id)
            .ok_or(GraphError::UnknownToken(id))
    }

    pub fn record(&self, id: RecordId) -> Result<&ActivityNodeExecution, GraphError> {
        self.executions
            .iter()
            .find(|r| r.id == id)
            .ok_or(GraphError::UnknownRecord(id))
    }

    /// All firings of `node` (at most one; nodes are never revisited)
    pub fn record_for_node(&self, node: NodeId) -> Option<&ActivityNodeExecution> {
        self.executions.iter().find(|r| r.node == node)
    }

    pub fn bound_value(&self, parameter: ParamId) -> Option<&Literal> {
        self.parameter_values
            .iter()
            .find(|pv| pv.parameter == parameter)
            .map(|pv| &pv.value)
    }

    /// Merge the consumed materials from all child calls into this record,
    /// one fresh material per distinct specification.
    ///
    /// Failure leaves the summary untouched; the rest of the run data stays
    /// intact either way.
    pub fn aggregate_child_materials(&mut self) -> Result<(), MaterialError> {
        let child_materials: Vec<Material> = self
            .executions
            .iter()
            .filter_map(|e| e.call.as_ref())
            .flat_map(|call| call.consumed_materials.iter().cloned())
            .collect();
        self.consumed_materials = aggregate_materials(&child_materials)?;
        Ok(())
    }
}
