use labcore::{
    ActivityNode, EdgeId, LabError, NodeId, Protocol, ProtocolExecution, Token, TokenId,
};
use std::collections::{HashMap, HashSet};

/// Resolve the node a token is waiting on: the edge's destination, or (for a
/// pin-internal token) the action owning the pin that produced it
pub fn token_target(
    protocol: &Protocol,
    ex: &ProtocolExecution,
    token: &Token,
) -> Result<NodeId, LabError> {
    match token.edge {
        Some(edge) => Ok(protocol.edge(edge)?.target),
        None => {
            let source = ex.record(token.source)?;
            match protocol.node(source.node)? {
                ActivityNode::Pin { action, .. } => Ok(*action),
                // pin tokens are only ever produced by pins
                _ => Ok(source.node),
            }
        }
    }
}

/// Find the nodes ready to fire given the current unconsumed token pool.
///
/// Read-only: never mutates tokens. Nodes with no in-flows are not found
/// here; those fire only as initiating nodes. The result is sorted by node
/// id so round order is deterministic.
pub fn executable_nodes(
    protocol: &Protocol,
    ex: &ProtocolExecution,
    pending: &[TokenId],
) -> Result<Vec<NodeId>, LabError> {
    let mut candidate_clusters: HashMap<NodeId, Vec<&Token>> = HashMap::new();
    for id in pending {
        let token = ex.token(*id)?;
        let target = token_target(protocol, ex, token)?;
        candidate_clusters.entry(target).or_default().push(token);
    }

    let mut ready = Vec::new();
    for (node, tokens) in &candidate_clusters {
        if enabled_activity_node(protocol, ex, *node, tokens)? {
            ready.push(*node);
        }
    }
    ready.sort();
    Ok(ready)
}

/// Check whether every incoming edge is covered by a token and, for actions,
/// whether every required input pin is satisfied
pub fn enabled_activity_node(
    protocol: &Protocol,
    ex: &ProtocolExecution,
    node: NodeId,
    tokens: &[&Token],
) -> Result<bool, LabError> {
    let edges_with_tokens: HashSet<EdgeId> = tokens.iter().filter_map(|t| t.edge).collect();
    let tokens_present = edges_with_tokens == protocol.incoming_edges(node);

    let ActivityNode::CallBehavior { behavior, .. } = protocol.node(node)? else {
        return Ok(tokens_present);
    };
    let behavior = protocol.behavior(*behavior)?;

    // Pins that already delivered a pin-internal token to this action
    let mut pins_with_tokens: HashSet<NodeId> = HashSet::new();
    for token in tokens {
        if token.edge.is_none() {
            pins_with_tokens.insert(ex.record(token.source)?.node);
        }
    }

    // Protocol-level bindings satisfy same-named pins without a token
    let parameter_names: HashSet<&str> = ex
        .parameter_values
        .iter()
        .filter_map(|pv| protocol.parameter(pv.parameter).ok())
        .map(|p| p.name.as_str())
        .collect();

    let mut input_pins_satisfied = true;
    for required in behavior.required_inputs() {
        let pin = protocol.input_pin(node, &required.name)?;
        // value pins carry their literal from authoring time and need no token
        if let ActivityNode::Pin { value: None, .. } = protocol.node(pin)? {
            let satisfied = pins_with_tokens.contains(&pin)
                || parameter_names.contains(required.name.as_str());
            if !satisfied {
                input_pins_satisfied = false;
            }
        }
    }

    Ok(tokens_present && input_pins_satisfied)
}
