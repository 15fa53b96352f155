// crates/labruntime/tests/validation_test.rs

use labcore::{Behavior, GraphError, Protocol};
use labruntime::validate_protocol;
use uuid::Uuid;

#[test]
fn well_formed_protocols_pass() {
    let mut protocol = Protocol::new("well formed");
    let behavior = protocol.add_behavior(Behavior::new("test/Prep").with_output("samples", true));
    let initial = protocol.add_initial();
    let action = protocol.add_call_behavior(behavior).unwrap();
    let fin = protocol.add_flow_final();
    protocol.add_control_flow(initial, action);
    protocol.add_control_flow(action, fin);

    assert!(validate_protocol(&protocol).is_ok());
}

#[test]
fn cyclic_protocols_are_rejected() {
    let mut protocol = Protocol::new("cycle");
    let a = protocol.add_fork();
    let b = protocol.add_fork();
    protocol.add_control_flow(a, b);
    protocol.add_control_flow(b, a);

    assert!(matches!(
        validate_protocol(&protocol),
        Err(GraphError::CyclicProtocol)
    ));
}

#[test]
fn dangling_edges_are_rejected() {
    let mut protocol = Protocol::new("dangling");
    let initial = protocol.add_initial();
    protocol.add_control_flow(initial, Uuid::new_v4());

    assert!(matches!(
        validate_protocol(&protocol),
        Err(GraphError::DanglingEdge(_))
    ));
}

#[test]
fn cycles_through_pin_ownership_are_rejected() {
    // feeding an action's own output back into one of its input pins makes
    // the implicit pin -> action -> pin flow cyclic
    let mut protocol = Protocol::new("self feeding");
    let behavior = protocol.add_behavior(
        Behavior::new("test/Loop")
            .with_input("sample", true)
            .with_output("sample", true),
    );
    let action = protocol.add_call_behavior(behavior).unwrap();
    let out = protocol.output_pin(action, "sample").unwrap();
    let input = protocol.input_pin(action, "sample").unwrap();
    protocol.add_object_flow(out, input);

    assert!(matches!(
        validate_protocol(&protocol),
        Err(GraphError::CyclicProtocol)
    ));
}
