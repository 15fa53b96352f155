use crate::enablement::token_target;
use crate::engine::ExecutionEngine;
use labcore::{
    ActivityNode, ActivityNodeExecution, BehaviorCall, BehaviorId, EdgeKind, FiringError,
    GraphError, LabError, Literal, NodeId, ParameterDirection, ParameterValue, Protocol,
    ProtocolExecution, RecordId, Token, TokenId,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

impl ExecutionEngine {
    /// Fire one node: consume its matched incoming tokens, append exactly one
    /// execution record, and return the updated pending token pool.
    ///
    /// Firing is atomic. Everything is computed into local state first and
    /// committed in one step at the end, so a failed firing leaves the record
    /// and token pools untouched.
    pub(crate) fn fire_node(
        &mut self,
        protocol: &Protocol,
        ex: &mut ProtocolExecution,
        node_id: NodeId,
        pending: Vec<TokenId>,
    ) -> Result<Vec<TokenId>, LabError> {
        // Incoming flows: pending tokens aimed at this node, whether along an
        // edge or from an input pin the node owns
        let mut inputs: Vec<TokenId> = Vec::new();
        for id in &pending {
            let token = ex.token(*id)?;
            if token_target(protocol, ex, token)? == node_id {
                inputs.push(*id);
            }
        }

        let record_id: RecordId = Uuid::new_v4();
        let mut new_tokens: Vec<Token> = Vec::new();
        let mut protocol_outputs: Vec<ParameterValue> = Vec::new();
        let mut call: Option<BehaviorCall> = None;

        let node = protocol.node(node_id)?;
        match node {
            ActivityNode::Initial => {
                if !inputs.is_empty() {
                    return Err(FiringError::InitialNodeArity {
                        node: node_id,
                        count: inputs.len(),
                    }
                    .into());
                }
                // a control token on every outgoing edge
                for edge in protocol.firing_out_edges(node_id) {
                    new_tokens.push(Token::new(Some(edge.id), record_id, Literal::Control));
                }
            }
            ActivityNode::FlowFinal => {
                // terminal: consumes its inputs, emits nothing
            }
            ActivityNode::Fork => {
                if inputs.len() != 1 {
                    return Err(FiringError::ForkNodeArity {
                        node: node_id,
                        count: inputs.len(),
                    }
                    .into());
                }
                let value = ex.token(inputs[0])?.value.clone();
                for edge in protocol.firing_out_edges(node_id) {
                    new_tokens.push(Token::new(Some(edge.id), record_id, value.clone()));
                }
            }
            ActivityNode::Parameter { parameter } => {
                let param = protocol.parameter(*parameter)?;
                match param.direction {
                    ParameterDirection::In => {
                        // emit the bound protocol input on every outgoing edge
                        let value = ex.bound_value(param.id).cloned().ok_or_else(|| {
                            FiringError::MissingParameterValue {
                                name: param.name.clone(),
                            }
                        })?;
                        for edge in protocol.firing_out_edges(node_id) {
                            new_tokens.push(Token::new(Some(edge.id), record_id, value.clone()));
                        }
                    }
                    ParameterDirection::Out => {
                        // exactly one object flow carries the final value
                        let mut object_values = Vec::new();
                        for id in &inputs {
                            let token = ex.token(*id)?;
                            if let Some(edge) = token.edge {
                                if protocol.edge(edge)?.kind == EdgeKind::ObjectFlow {
                                    object_values.push(token.value.clone());
                                }
                            }
                        }
                        if object_values.len() != 1 {
                            return Err(FiringError::OutputParameterArity {
                                node: node_id,
                                count: object_values.len(),
                            }
                            .into());
                        }
                        protocol_outputs.push(ParameterValue::new(
                            param.id,
                            object_values.remove(0),
                        ));
                    }
                }
            }
            ActivityNode::Pin { .. } => {
                if inputs.len() != 1 {
                    return Err(FiringError::PinArity {
                        node: node_id,
                        count: inputs.len(),
                    }
                    .into());
                }
                // pass-through: re-emit the value as a pin-internal token
                let value = ex.token(inputs[0])?.value.clone();
                new_tokens.push(Token::new(None, record_id, value));
            }
            ActivityNode::CallBehavior {
                behavior,
                input_pins,
                output_pins,
            } => {
                let fired = self.fire_call_behavior(
                    protocol,
                    ex,
                    node_id,
                    *behavior,
                    input_pins,
                    output_pins,
                    &inputs,
                    record_id,
                )?;
                call = Some(fired.call);
                new_tokens = fired.tokens;
                protocol_outputs = fired.possible_outputs;
            }
            ActivityNode::Join | ActivityNode::Merge | ActivityNode::Decision => {
                return Err(FiringError::UnsupportedNode {
                    node: node_id,
                    kind: node.kind_name().to_string(),
                }
                .into());
            }
        }

        tracing::debug!(
            node = %node_id,
            kind = node.kind_name(),
            consumed = inputs.len(),
            produced = new_tokens.len(),
            "fired node"
        );

        // commit
        let produced: Vec<TokenId> = new_tokens.iter().map(|t| t.id).collect();
        ex.flows.extend(new_tokens);
        ex.parameter_values.extend(protocol_outputs);
        ex.executions.push(ActivityNodeExecution {
            id: record_id,
            node: node_id,
            incoming: inputs.clone(),
            call,
        });
        self.notify_process(protocol, ex);

        let consumed: HashSet<TokenId> = inputs.into_iter().collect();
        let mut next: Vec<TokenId> = pending
            .into_iter()
            .filter(|t| !consumed.contains(t))
            .collect();
        next.extend(produced);
        Ok(next)
    }

    /// Fire a call behavior action: bind pin values, invoke the primitive for
    /// every produced output, and collect the call record
    #[allow(clippy::too_many_arguments)]
    fn fire_call_behavior(
        &mut self,
        protocol: &Protocol,
        ex: &ProtocolExecution,
        node_id: NodeId,
        behavior_id: BehaviorId,
        input_pins: &[NodeId],
        output_pins: &[NodeId],
        inputs: &[TokenId],
        record_id: RecordId,
    ) -> Result<FiredCall, LabError> {
        let behavior = protocol.behavior(behavior_id)?;

        // Merge token-delivered pin values with authoring-time value-pin
        // literals; value pins win on overlap
        let mut pin_values: HashMap<NodeId, Literal> = HashMap::new();
        for id in inputs {
            let token = ex.token(*id)?;
            if token.edge.is_none() {
                pin_values.insert(ex.record(token.source)?.node, token.value.clone());
            }
        }
        for pin in input_pins {
            if let ActivityNode::Pin { value: Some(v), .. } = protocol.node(*pin)? {
                pin_values.insert(*pin, v.clone());
            }
        }

        // Ordered input bindings; canonical parameter order matters to
        // external recorders
        let mut input_values: Vec<ParameterValue> = Vec::new();
        for pin in input_pins {
            let ActivityNode::Pin { name, .. } = protocol.node(*pin)? else {
                continue;
            };
            if let Some(value) = pin_values.get(pin) {
                let param = behavior.parameter(name).ok_or_else(|| GraphError::UnknownPin {
                    action: node_id,
                    name: name.clone(),
                })?;
                input_values.push(ParameterValue::new(param.id, value.clone()));
            }
        }
        input_values.sort_by_key(|pv| {
            behavior
                .parameter_by_id(pv.parameter)
                .map(|p| p.index)
                .unwrap_or(u32::MAX)
        });

        let start_time = self.clock.now();
        let end_time = self.clock.now();
        let primitive = self.registry().resolve(&behavior.identity);

        let mut call = BehaviorCall {
            id: Uuid::new_v4(),
            name: format!("execute_{}", self.next_id()),
            parameter_values: input_values.clone(),
            start_time,
            end_time,
            completed_normally: true,
            consumed_materials: primitive.consumed_materials(&input_values),
        };

        // One token per outgoing edge; object flows get their value from the
        // primitive, keyed by the source pin's parameter
        let out_edges = protocol.firing_out_edges(node_id);
        let mut tokens = Vec::with_capacity(out_edges.len());
        for edge in &out_edges {
            let value = match edge.kind {
                EdgeKind::ControlFlow => Literal::Control,
                EdgeKind::ObjectFlow => {
                    let ActivityNode::Pin { name, .. } = protocol.node(edge.source)? else {
                        return Err(GraphError::NotAnAction(edge.source).into());
                    };
                    let param = protocol.pin_parameter(node_id, name)?;
                    let value = primitive.compute_output(behavior, &input_values, param)?;
                    call.parameter_values
                        .push(ParameterValue::new(param.id, value.clone()));
                    value
                }
            };
            tokens.push(Token::new(Some(edge.id), record_id, value));
        }

        // Output pins with no outgoing edge are assumed to be protocol
        // outputs rather than discarded
        let connected: HashSet<NodeId> = out_edges.iter().map(|e| e.source).collect();
        let mut possible_outputs = Vec::new();
        for pin in output_pins {
            if connected.contains(pin) {
                continue;
            }
            let ActivityNode::Pin { name, .. } = protocol.node(*pin)? else {
                continue;
            };
            let param = behavior.parameter(name).ok_or_else(|| GraphError::UnknownPin {
                action: node_id,
                name: name.clone(),
            })?;
            let value = primitive.compute_output(behavior, &input_values, param)?;
            possible_outputs.push(ParameterValue::new(param.id, value));
        }

        Ok(FiredCall {
            call,
            tokens,
            possible_outputs,
        })
    }
}

struct FiredCall {
    call: BehaviorCall,
    tokens: Vec<Token>,
    possible_outputs: Vec<ParameterValue>,
}
