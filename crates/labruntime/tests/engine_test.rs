// crates/labruntime/tests/engine_test.rs

use labcore::{
    ActivityNode, ActivityNodeExecution, Agent, Behavior, FiringError, LabError, Literal, Material,
    Measure, NodeId, Parameter, ParameterDirection, ParameterValue, Protocol, ProtocolExecution,
    TokenId,
};
use labruntime::{BehaviorSpecialization, ExecutionEngine, Primitive, PrimitiveRegistry};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

fn engine() -> ExecutionEngine {
    ExecutionEngine::new(Arc::new(PrimitiveRegistry::new()))
}

fn agent() -> Agent {
    Agent::new("test-operator")
}

/// Initial -> Fork -> two prep actions, each draining into its own flow
/// final. Each action's `samples` output pin is left unconnected.
fn parallel_prep_protocol() -> Protocol {
    let mut protocol = Protocol::new("parallel prep");
    let behavior = protocol.add_behavior(Behavior::new("test/Prep").with_output("samples", true));

    let initial = protocol.add_initial();
    let fork = protocol.add_fork();
    protocol.add_control_flow(initial, fork);

    for _ in 0..2 {
        let action = protocol.add_call_behavior(behavior).unwrap();
        let fin = protocol.add_flow_final();
        protocol.add_control_flow(fork, action);
        protocol.add_control_flow(action, fin);
    }
    protocol
}

#[test]
fn parallel_prep_fires_every_node() {
    let protocol = parallel_prep_protocol();
    let ex = engine()
        .execute(&protocol, agent(), Vec::new(), None, None)
        .unwrap();

    // initial + fork + 2 actions + 2 finals
    assert_eq!(ex.executions.len(), 6);
    assert_eq!(ex.executions.iter().filter(|r| r.call.is_some()).count(), 2);
    assert!(ex.end_time.is_some());
    assert!(ex.completed_normally);

    // unconnected samples pins surface as possible protocol outputs, computed
    // by the placeholder primitive
    assert_eq!(ex.parameter_values.len(), 2);
    for pv in &ex.parameter_values {
        assert_eq!(pv.value, Literal::String("samples".to_string()));
    }
}

#[test]
fn tokens_are_consumed_exactly_once() {
    let protocol = parallel_prep_protocol();
    let ex = engine()
        .execute(&protocol, agent(), Vec::new(), None, None)
        .unwrap();

    let mut consumed: Vec<TokenId> = Vec::new();
    for record in &ex.executions {
        consumed.extend(&record.incoming);
    }
    let distinct: HashSet<TokenId> = consumed.iter().copied().collect();
    assert_eq!(distinct.len(), consumed.len(), "a token was consumed twice");

    let produced: HashSet<TokenId> = ex.flows.iter().map(|t| t.id).collect();
    assert_eq!(distinct, produced, "some tokens were never consumed");
}

#[test]
fn fork_fans_a_bound_input_out_to_every_branch() {
    let mut protocol = Protocol::new("fan out");
    let plate = protocol.add_parameter("plate", ParameterDirection::In, true);
    let plate_node = protocol.add_parameter_node(plate).unwrap();
    let fork = protocol.add_fork();
    protocol.add_object_flow(plate_node, fork);

    let mut outputs = Vec::new();
    for name in ["left", "middle", "right"] {
        let out = protocol.add_parameter(name, ParameterDirection::Out, true);
        let out_node = protocol.add_parameter_node(out).unwrap();
        protocol.add_object_flow(fork, out_node);
        outputs.push(out);
    }

    let bindings = vec![ParameterValue::new(plate, Literal::from("plate-9"))];
    let ex = engine()
        .execute(&protocol, agent(), bindings, None, None)
        .unwrap();

    assert!(ex.completed_normally);
    for out in outputs {
        assert_eq!(
            ex.bound_value(out),
            Some(&Literal::String("plate-9".to_string()))
        );
    }
}

#[test]
fn initial_node_with_an_input_is_a_firing_error() {
    let mut protocol = Protocol::new("chained initials");
    let first = protocol.add_initial();
    let second = protocol.add_initial();
    protocol.add_control_flow(first, second);

    let err = engine()
        .execute(&protocol, agent(), Vec::new(), None, None)
        .unwrap_err();
    assert!(matches!(
        err,
        LabError::Firing(FiringError::InitialNodeArity { count: 1, .. })
    ));
}

#[test]
fn fork_with_two_inputs_is_a_firing_error() {
    let mut protocol = Protocol::new("over-fed fork");
    let initial = protocol.add_initial();
    let fork = protocol.add_fork();
    let fin = protocol.add_flow_final();
    protocol.add_control_flow(initial, fork);
    protocol.add_control_flow(initial, fork);
    protocol.add_control_flow(fork, fin);

    let err = engine()
        .execute(&protocol, agent(), Vec::new(), None, None)
        .unwrap_err();
    assert!(matches!(
        err,
        LabError::Firing(FiringError::ForkNodeArity { count: 2, .. })
    ));
}

#[test]
fn join_nodes_are_rejected_when_fired() {
    let mut protocol = Protocol::new("join");
    let initial = protocol.add_initial();
    let join = protocol.add_node(ActivityNode::Join);
    protocol.add_control_flow(initial, join);

    let err = engine()
        .execute(&protocol, agent(), Vec::new(), None, None)
        .unwrap_err();
    match err {
        LabError::Firing(FiringError::UnsupportedNode { kind, .. }) => {
            assert_eq!(kind, "JoinNode");
        }
        other => panic!("expected unsupported-node error, got {other}"),
    }
}

#[test]
fn flow_final_waits_for_all_incoming_edges() {
    // short branch straight from the fork, long branch through an action;
    // the final must fire once, after both branches arrive
    let mut protocol = Protocol::new("rendezvous");
    let behavior = protocol.add_behavior(Behavior::new("test/Noop"));
    let initial = protocol.add_initial();
    let fork = protocol.add_fork();
    let action = protocol.add_call_behavior(behavior).unwrap();
    let fin = protocol.add_flow_final();
    protocol.add_control_flow(initial, fork);
    protocol.add_control_flow(fork, fin);
    protocol.add_control_flow(fork, action);
    protocol.add_control_flow(action, fin);

    let ex = engine()
        .execute(&protocol, agent(), Vec::new(), None, None)
        .unwrap();

    let finals: Vec<_> = ex.executions.iter().filter(|r| r.node == fin).collect();
    assert_eq!(finals.len(), 1);
    assert_eq!(finals[0].incoming.len(), 2);
}

#[test]
fn ordinal_runs_are_deterministic() {
    let mut protocol = Protocol::new("two steps");
    let behavior = protocol.add_behavior(Behavior::new("test/Noop"));
    let initial = protocol.add_initial();
    let first = protocol.add_call_behavior(behavior).unwrap();
    let second = protocol.add_call_behavior(behavior).unwrap();
    let fin = protocol.add_flow_final();
    protocol.add_control_flow(initial, first);
    protocol.add_control_flow(first, second);
    protocol.add_control_flow(second, fin);

    let timestamps = |ex: &ProtocolExecution| {
        let mut stamps = vec![ex.start_time];
        for record in &ex.executions {
            if let Some(call) = &record.call {
                stamps.push(call.start_time);
                stamps.push(call.end_time);
            }
        }
        stamps.push(ex.end_time.unwrap());
        stamps
    };

    let mut engine = engine().with_ordinal_time(true);
    let a = engine
        .execute(&protocol, agent(), Vec::new(), None, None)
        .unwrap();
    let b = engine
        .execute(&protocol, agent(), Vec::new(), None, None)
        .unwrap();

    let stamps = timestamps(&a);
    assert_eq!(stamps, timestamps(&b));
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn connected_output_binds_the_required_protocol_output() {
    let mut protocol = Protocol::new("measured");
    let behavior = protocol.add_behavior(Behavior::new("test/Prep").with_output("samples", true));
    let initial = protocol.add_initial();
    let action = protocol.add_call_behavior(behavior).unwrap();
    protocol.add_control_flow(initial, action);

    let samples = protocol.add_parameter("samples", ParameterDirection::Out, true);
    let samples_node = protocol.add_parameter_node(samples).unwrap();
    let pin = protocol.output_pin(action, "samples").unwrap();
    protocol.add_object_flow(pin, samples_node);

    let ex = engine()
        .execute(&protocol, agent(), Vec::new(), None, None)
        .unwrap();
    assert!(ex.completed_normally);
    assert_eq!(
        ex.bound_value(samples),
        Some(&Literal::String("samples".to_string()))
    );
}

#[test]
fn unproduced_required_output_fails_completion() {
    let mut protocol = Protocol::new("hollow");
    let initial = protocol.add_initial();
    let fin = protocol.add_flow_final();
    protocol.add_control_flow(initial, fin);
    protocol.add_parameter("data", ParameterDirection::Out, true);

    let ex = engine()
        .execute(&protocol, agent(), Vec::new(), None, None)
        .unwrap();
    assert!(!ex.completed_normally);
}

#[test]
fn possible_outputs_do_not_satisfy_required_protocol_outputs() {
    // the unconnected pins produce possible outputs keyed by the behavior's
    // own parameters, which must not count as the protocol's "samples"
    let mut protocol = parallel_prep_protocol();
    protocol.add_parameter("samples", ParameterDirection::Out, true);

    let ex = engine()
        .execute(&protocol, agent(), Vec::new(), None, None)
        .unwrap();
    assert_eq!(ex.parameter_values.len(), 2);
    assert!(!ex.completed_normally);
}

#[test]
fn bound_protocol_inputs_satisfy_required_pins_by_name() {
    let mut protocol = Protocol::new("named binding");
    let behavior = protocol.add_behavior(
        Behavior::new("test/Measure")
            .with_input("specimen", true)
            .with_output("measurements", false),
    );
    let initial = protocol.add_initial();
    let action = protocol.add_call_behavior(behavior).unwrap();
    protocol.add_control_flow(initial, action);
    let specimen = protocol.add_parameter("specimen", ParameterDirection::In, true);

    let bindings = vec![ParameterValue::new(specimen, Literal::from("specimen-1"))];
    let ex = engine()
        .execute(&protocol, agent(), bindings, None, None)
        .unwrap();
    assert!(ex.record_for_node(action).is_some());
}

#[test]
fn unsatisfied_required_pin_blocks_the_action() {
    let mut protocol = Protocol::new("starved action");
    let behavior = protocol.add_behavior(Behavior::new("test/Measure").with_input("specimen", true));
    let initial = protocol.add_initial();
    let action = protocol.add_call_behavior(behavior).unwrap();
    protocol.add_control_flow(initial, action);

    // no binding, no token for the pin: the run ends without firing the action
    let ex = engine()
        .execute(&protocol, agent(), Vec::new(), None, None)
        .unwrap();
    assert!(ex.record_for_node(action).is_none());
    assert_eq!(ex.executions.len(), 1);
}

#[test]
fn unbound_input_parameter_node_is_a_firing_error() {
    let mut protocol = Protocol::new("unbound input");
    let plate = protocol.add_parameter("plate", ParameterDirection::In, true);
    let plate_node = protocol.add_parameter_node(plate).unwrap();
    let fin = protocol.add_flow_final();
    protocol.add_object_flow(plate_node, fin);

    let err = engine()
        .execute(&protocol, agent(), Vec::new(), None, None)
        .unwrap_err();
    match err {
        LabError::Firing(FiringError::MissingParameterValue { name }) => {
            assert_eq!(name, "plate");
        }
        other => panic!("expected missing-parameter error, got {other}"),
    }
}

struct CountingSpecialization {
    seen: Arc<Mutex<Vec<NodeId>>>,
    fail: bool,
}

impl BehaviorSpecialization for CountingSpecialization {
    fn process(
        &mut self,
        _protocol: &Protocol,
        record: &ActivityNodeExecution,
        _ex: &ProtocolExecution,
    ) -> Result<(), LabError> {
        self.seen.lock().unwrap().push(record.node);
        if self.fail {
            return Err(FiringError::Primitive {
                behavior: "test/Observer".to_string(),
                message: "robot unreachable".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[test]
fn failing_observer_does_not_abort_the_run() {
    let protocol = parallel_prep_protocol();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut engine = engine().with_specialization(Box::new(CountingSpecialization {
        seen: Arc::clone(&seen),
        fail: true,
    }));

    let ex = engine
        .execute(&protocol, agent(), Vec::new(), None, None)
        .unwrap();
    assert_eq!(ex.executions.len(), 6);
    assert_eq!(seen.lock().unwrap().len(), 6);
}

struct ConsumingPrimitive;

impl Primitive for ConsumingPrimitive {
    fn compute_output(
        &self,
        _behavior: &Behavior,
        _inputs: &[ParameterValue],
        output: &Parameter,
    ) -> Result<Literal, FiringError> {
        Ok(Literal::String(output.name.clone()))
    }

    fn consumed_materials(&self, _inputs: &[ParameterValue]) -> Vec<Material> {
        vec![Material::new("PBS", Measure::new(50.0, "microliter"))]
    }
}

#[test]
fn consumed_materials_are_rolled_up_across_calls() {
    let protocol = parallel_prep_protocol();
    let mut registry = PrimitiveRegistry::new();
    registry.register("test/Prep", Arc::new(ConsumingPrimitive));
    let mut engine = ExecutionEngine::new(Arc::new(registry));

    let ex = engine
        .execute(&protocol, agent(), Vec::new(), None, None)
        .unwrap();
    assert_eq!(
        ex.consumed_materials,
        vec![Material::new("PBS", Measure::new(100.0, "microliter"))]
    );
}
