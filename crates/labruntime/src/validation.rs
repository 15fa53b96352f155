use labcore::{ActivityNode, GraphError, NodeId, Protocol};
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use std::collections::HashMap;

/// Structural check run before execution.
///
/// Verifies that every id reference resolves in the arena and that the graph
/// is acyclic: nodes fire at most once per run, so a cycle could never
/// exhaust its tokens.
pub fn validate_protocol(protocol: &Protocol) -> Result<(), GraphError> {
    for (id, node) in &protocol.nodes {
        match node {
            ActivityNode::Parameter { parameter } => {
                protocol.parameter(*parameter)?;
            }
            ActivityNode::CallBehavior {
                behavior,
                input_pins,
                output_pins,
            } => {
                protocol.behavior(*behavior)?;
                for pin in input_pins.iter().chain(output_pins) {
                    if !matches!(protocol.node(*pin)?, ActivityNode::Pin { .. }) {
                        return Err(GraphError::NotAPin {
                            action: *id,
                            node: *pin,
                        });
                    }
                }
            }
            ActivityNode::Pin { action, .. } => {
                if !matches!(protocol.node(*action)?, ActivityNode::CallBehavior { .. }) {
                    return Err(GraphError::NotAnAction(*id));
                }
            }
            _ => {}
        }
    }

    let mut graph = DiGraph::<NodeId, ()>::new();
    let mut node_to_index = HashMap::new();
    for id in protocol.nodes.keys() {
        let idx = graph.add_node(*id);
        node_to_index.insert(*id, idx);
    }

    for edge in protocol.edges.values() {
        let from = node_to_index
            .get(&edge.source)
            .ok_or(GraphError::DanglingEdge(edge.id))?;
        let to = node_to_index
            .get(&edge.target)
            .ok_or(GraphError::DanglingEdge(edge.id))?;
        graph.add_edge(*from, *to, ());
    }

    // Pin ownership is an implicit flow: input pin -> action -> output pin
    for (id, node) in &protocol.nodes {
        if let ActivityNode::CallBehavior {
            input_pins,
            output_pins,
            ..
        } = node
        {
            let action_idx = node_to_index[id];
            for pin in input_pins {
                graph.add_edge(node_to_index[pin], action_idx, ());
            }
            for pin in output_pins {
                graph.add_edge(action_idx, node_to_index[pin], ());
            }
        }
    }

    if toposort(&graph, None).is_err() {
        return Err(GraphError::CyclicProtocol);
    }

    Ok(())
}
