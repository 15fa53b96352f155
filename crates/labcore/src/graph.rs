use crate::{GraphError, Literal};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

pub type NodeId = Uuid;
pub type EdgeId = Uuid;
pub type ParamId = Uuid;
pub type BehaviorId = Uuid;

/// Direction of a declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterDirection {
    In,
    Out,
}

/// A declared input or output of a behavior or of the protocol itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub id: ParamId,
    pub name: String,
    pub direction: ParameterDirection,
    /// Declared ordering index; load-bearing for canonical parameter ordering
    pub index: u32,
    pub required: bool,
}

/// An invocable behavior (primitive), declared by identity with its parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Behavior {
    pub id: BehaviorId,
    pub identity: String,
    pub parameters: Vec<Parameter>,
}

impl Behavior {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity: identity.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, required: bool) -> Self {
        self.push_parameter(name, ParameterDirection::In, required);
        self
    }

    pub fn with_output(mut self, name: impl Into<String>, required: bool) -> Self {
        self.push_parameter(name, ParameterDirection::Out, required);
        self
    }

    fn push_parameter(&mut self, name: impl Into<String>, direction: ParameterDirection, required: bool) {
        let index = self.parameters.len() as u32;
        self.parameters.push(Parameter {
            id: Uuid::new_v4(),
            name: name.into(),
            direction,
            index,
            required,
        });
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn parameter_by_id(&self, id: ParamId) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.id == id)
    }

    pub fn required_inputs(&self) -> Vec<&Parameter> {
        self.parameters
            .iter()
            .filter(|p| p.direction == ParameterDirection::In && p.required)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    ControlFlow,
    ObjectFlow,
}

/// Directed edge between activity nodes (or pins)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub kind: EdgeKind,
    pub source: NodeId,
    pub target: NodeId,
}

/// Activity node kinds; firing semantics live in the runtime dispatcher.
///
/// Join, Merge and Decision can be authored and loaded, but firing any of
/// them is a fatal unsupported-kind error: their synchronization semantics
/// are deliberately unspecified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ActivityNode {
    Initial,
    FlowFinal,
    Fork,
    Parameter {
        parameter: ParamId,
    },
    CallBehavior {
        behavior: BehaviorId,
        input_pins: Vec<NodeId>,
        output_pins: Vec<NodeId>,
    },
    Pin {
        action: NodeId,
        name: String,
        /// Fixed literal set at authoring time; `Some` makes this a value pin
        value: Option<Literal>,
    },
    Join,
    Merge,
    Decision,
}

impl ActivityNode {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ActivityNode::Initial => "InitialNode",
            ActivityNode::FlowFinal => "FlowFinalNode",
            ActivityNode::Fork => "ForkNode",
            ActivityNode::Parameter { .. } => "ActivityParameterNode",
            ActivityNode::CallBehavior { .. } => "CallBehaviorAction",
            ActivityNode::Pin { .. } => "Pin",
            ActivityNode::Join => "JoinNode",
            ActivityNode::Merge => "MergeNode",
            ActivityNode::Decision => "DecisionNode",
        }
    }
}

/// Immutable activity graph for one laboratory protocol.
///
/// Nodes, edges, behaviors and parameters live in id-keyed arenas; every
/// relation is an identifier reference resolved through the arena, since the
/// graph and the execution record cross-reference each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Protocol {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub nodes: HashMap<NodeId, ActivityNode>,
    pub edges: HashMap<EdgeId, Edge>,
    pub behaviors: HashMap<BehaviorId, Behavior>,
    pub parameters: HashMap<ParamId, Parameter>,
}

impl Protocol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            nodes: HashMap::new(),
            edges: HashMap::new(),
            behaviors: HashMap::new(),
            parameters: HashMap::new(),
        }
    }

    // ----- construction -----

    pub fn add_behavior(&mut self, behavior: Behavior) -> BehaviorId {
        let id = behavior.id;
        self.behaviors.insert(id, behavior);
        id
    }

    pub fn add_initial(&mut self) -> NodeId {
        self.add_node(ActivityNode::Initial)
    }

    pub fn add_flow_final(&mut self) -> NodeId {
        self.add_node(ActivityNode::FlowFinal)
    }

    pub fn add_fork(&mut self) -> NodeId {
        self.add_node(ActivityNode::Fork)
    }

    pub fn add_node(&mut self, node: ActivityNode) -> NodeId {
        let id = Uuid::new_v4();
        self.nodes.insert(id, node);
        id
    }

    /// Declare a protocol-level parameter
    pub fn add_parameter(
        &mut self,
        name: impl Into<String>,
        direction: ParameterDirection,
        required: bool,
    ) -> ParamId {
        let index = self.parameters.len() as u32;
        let param = Parameter {
            id: Uuid::new_v4(),
            name: name.into(),
            direction,
            index,
            required,
        };
        let id = param.id;
        self.parameters.insert(id, param);
        id
    }

    /// Add the activity node standing for a declared protocol parameter
    pub fn add_parameter_node(&mut self, parameter: ParamId) -> Result<NodeId, GraphError> {
        if !self.parameters.contains_key(&parameter) {
            return Err(GraphError::UnknownParameter(parameter));
        }
        Ok(self.add_node(ActivityNode::Parameter { parameter }))
    }

    /// Add an action invoking `behavior`, creating one pin per declared parameter
    pub fn add_call_behavior(&mut self, behavior: BehaviorId) -> Result<NodeId, GraphError> {
        let params: Vec<(String, ParameterDirection)> = self
            .behavior(behavior)?
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.direction))
            .collect();

        let action = self.add_node(ActivityNode::CallBehavior {
            behavior,
            input_pins: Vec::new(),
            output_pins: Vec::new(),
        });

        let mut input_pins = Vec::new();
        let mut output_pins = Vec::new();
        for (name, direction) in params {
            let pin = self.add_node(ActivityNode::Pin {
                action,
                name,
                value: None,
            });
            match direction {
                ParameterDirection::In => input_pins.push(pin),
                ParameterDirection::Out => output_pins.push(pin),
            }
        }

        if let Some(ActivityNode::CallBehavior {
            input_pins: inputs,
            output_pins: outputs,
            ..
        }) = self.nodes.get_mut(&action)
        {
            *inputs = input_pins;
            *outputs = output_pins;
        }
        Ok(action)
    }

    /// Fix a literal on an input pin, turning it into a value pin
    pub fn set_pin_value(
        &mut self,
        action: NodeId,
        pin_name: &str,
        literal: Literal,
    ) -> Result<(), GraphError> {
        let pin = self.input_pin(action, pin_name)?;
        // Reference-typed literals stay references; owned values are stored as-is
        if let Some(ActivityNode::Pin { value, .. }) = self.nodes.get_mut(&pin) {
            *value = Some(literal);
        }
        Ok(())
    }

    pub fn add_control_flow(&mut self, source: NodeId, target: NodeId) -> EdgeId {
        self.add_edge(EdgeKind::ControlFlow, source, target)
    }

    pub fn add_object_flow(&mut self, source: NodeId, target: NodeId) -> EdgeId {
        self.add_edge(EdgeKind::ObjectFlow, source, target)
    }

    fn add_edge(&mut self, kind: EdgeKind, source: NodeId, target: NodeId) -> EdgeId {
        let id = Uuid::new_v4();
        self.edges.insert(
            id,
            Edge {
                id,
                kind,
                source,
                target,
            },
        );
        id
    }

    // ----- arena lookups -----

    pub fn node(&self, id: NodeId) -> Result<&ActivityNode, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::UnknownNode(id))
    }

    pub fn edge(&self, id: EdgeId) -> Result<&Edge, GraphError> {
        self.edges.get(&id).ok_or(GraphError::UnknownEdge(id))
    }

    pub fn behavior(&self, id: BehaviorId) -> Result<&Behavior, GraphError> {
        self.behaviors.get(&id).ok_or(GraphError::UnknownBehavior(id))
    }

    pub fn parameter(&self, id: ParamId) -> Result<&Parameter, GraphError> {
        self.parameters.get(&id).ok_or(GraphError::UnknownParameter(id))
    }

    pub fn parameter_by_name(&self, name: &str) -> Option<&Parameter> {
        self.parameters.values().find(|p| p.name == name)
    }

    // ----- read-only queries used by the engine -----

    /// Nodes that fire in the first round: initial nodes and IN parameter
    /// nodes, neither of which has incoming edges. Sorted by id so round
    /// order is stable.
    pub fn initiating_nodes(&self) -> Vec<NodeId> {
        let targets: HashSet<NodeId> = self.edges.values().map(|e| e.target).collect();
        let mut initiating: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(id, node)| {
                if targets.contains(*id) {
                    return false;
                }
                match node {
                    ActivityNode::Initial => true,
                    ActivityNode::Parameter { parameter } => self
                        .parameters
                        .get(parameter)
                        .map(|p| p.direction == ParameterDirection::In)
                        .unwrap_or(false),
                    _ => false,
                }
            })
            .map(|(id, _)| *id)
            .collect();
        initiating.sort();
        initiating
    }

    pub fn incoming_edges(&self, node: NodeId) -> HashSet<EdgeId> {
        self.edges
            .values()
            .filter(|e| e.target == node)
            .map(|e| e.id)
            .collect()
    }

    /// Edges leaving a node when it fires. For an action this includes edges
    /// whose source is one of its pins. Sorted by edge id for stable fan-out.
    pub fn firing_out_edges(&self, node: NodeId) -> Vec<&Edge> {
        let mut out: Vec<&Edge> = self
            .edges
            .values()
            .filter(|e| {
                e.source == node
                    || matches!(self.nodes.get(&e.source),
                        Some(ActivityNode::Pin { action, .. }) if *action == node)
            })
            .collect();
        out.sort_by_key(|e| e.id);
        out
    }

    /// Find an input pin of an action by name
    pub fn input_pin(&self, action: NodeId, name: &str) -> Result<NodeId, GraphError> {
        let ActivityNode::CallBehavior { input_pins, .. } = self.node(action)? else {
            return Err(GraphError::NotAnAction(action));
        };
        for pin in input_pins {
            if let ActivityNode::Pin { name: pin_name, .. } = self.node(*pin)? {
                if pin_name == name {
                    return Ok(*pin);
                }
            }
        }
        Err(GraphError::UnknownPin {
            action,
            name: name.to_string(),
        })
    }

    /// Find an output pin of an action by name
    pub fn output_pin(&self, action: NodeId, name: &str) -> Result<NodeId, GraphError> {
        let ActivityNode::CallBehavior { output_pins, .. } = self.node(action)? else {
            return Err(GraphError::NotAnAction(action));
        };
        for pin in output_pins {
            if let ActivityNode::Pin { name: pin_name, .. } = self.node(*pin)? {
                if pin_name == name {
                    return Ok(*pin);
                }
            }
        }
        Err(GraphError::UnknownPin {
            action,
            name: name.to_string(),
        })
    }

    /// Resolve the behavior parameter a pin of `action` is bound to
    pub fn pin_parameter(&self, action: NodeId, pin_name: &str) -> Result<&Parameter, GraphError> {
        let ActivityNode::CallBehavior { behavior, .. } = self.node(action)? else {
            return Err(GraphError::NotAnAction(action));
        };
        self.behavior(*behavior)?
            .parameter(pin_name)
            .ok_or_else(|| GraphError::UnknownPin {
                action,
                name: pin_name.to_string(),
            })
    }

    /// Protocol-level output parameters that must be bound for a run to
    /// complete normally
    pub fn required_outputs(&self) -> Vec<&Parameter> {
        self.parameters
            .values()
            .filter(|p| p.direction == ParameterDirection::Out && p.required)
            .collect()
    }
}
