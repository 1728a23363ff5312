use pretty_assertions::assert_eq;
use stroke_core::{GateMachine, GateState, SeekController, Transport};
use stroke_domain_eval::Gate;
use stroke_ports::transport::TransportPort;

fn running_transport_at(tick: i64) -> Transport {
    let mut transport = Transport::new(192, 120.0);
    transport.set_position(tick);
    transport.start();
    transport
}

#[test]
fn opening_pauses_and_snaps_to_the_onset() {
    let mut transport = running_transport_at(170);
    let mut gates = GateMachine::new();

    gates.open(Gate::new([38, 42], 192).expect("gate"), &mut transport);

    assert!(gates.is_gated());
    assert!(!transport.is_running());
    assert_eq!(transport.position(), 192);
    assert_eq!(gates.required_notes(), vec![38, 42]);
}

#[test]
fn a_second_open_is_ignored() {
    let mut transport = running_transport_at(170);
    let mut gates = GateMachine::new();
    gates.open(Gate::new([38], 192).expect("gate"), &mut transport);
    gates.open(Gate::new([36], 384).expect("gate"), &mut transport);

    assert_eq!(gates.required_notes(), vec![38]);
    assert_eq!(transport.position(), 192);
}

#[test]
fn resume_nudges_one_tick_and_restarts() {
    let mut transport = running_transport_at(170);
    let mut gates = GateMachine::new();
    gates.open(Gate::new([38], 192).expect("gate"), &mut transport);

    let resolved = gates.resume(&mut transport).expect("pending gate");
    assert_eq!(resolved.opened_at(), 192);
    assert_eq!(gates.state(), &GateState::Running);
    assert_eq!(transport.position(), 193);
    assert!(transport.is_running());

    assert_eq!(gates.resume(&mut transport), None);
    assert_eq!(transport.position(), 193);
}

#[test]
fn seek_clears_the_gate_without_starting() {
    let mut transport = running_transport_at(170);
    let mut gates = GateMachine::new();
    let seeker = SeekController::new();
    gates.open(Gate::new([38], 192).expect("gate"), &mut transport);

    let outcome = seeker.seek(700, &mut transport, &mut gates);
    assert_eq!(outcome.tick, 700);
    assert_eq!(outcome.cleared.map(|gate| gate.opened_at()), Some(192));
    assert!(!gates.is_gated());
    assert!(!transport.is_running());
    assert_eq!(transport.position(), 700);
}

#[test]
fn reset_pauses_and_loop_keeps_running() {
    let mut transport = running_transport_at(900);
    let mut gates = GateMachine::new();
    let seeker = SeekController::new();

    let outcome = seeker.loop_to(192, &mut transport, &mut gates);
    assert_eq!(outcome.tick, 192);
    assert!(transport.is_running());

    let outcome = seeker.reset_to_start(&mut transport, &mut gates);
    assert_eq!(outcome.tick, 0);
    assert!(outcome.cleared.is_none());
    assert!(!transport.is_running());
}
