use pretty_assertions::assert_eq;
use std::time::Duration;
use stroke_core::{Transport, TransportState};
use stroke_ports::transport::TransportPort;

#[test]
fn advances_only_while_playing() {
    let mut transport = Transport::new(192, 120.0);
    assert_eq!(transport.state(), TransportState::Stopped);

    transport.advance(Duration::from_millis(250));
    assert_eq!(transport.position(), 0);

    transport.start();
    transport.advance(Duration::from_millis(250));
    assert_eq!(transport.position(), 96);

    transport.pause();
    assert_eq!(transport.state(), TransportState::Paused);
    transport.advance(Duration::from_secs(1));
    assert_eq!(transport.position(), 96);
}

#[test]
fn short_steps_carry_the_fraction() {
    let mut transport = Transport::new(192, 120.0);
    transport.start();
    for _ in 0..10 {
        transport.advance(Duration::from_millis(1));
    }
    // 10 ms at 384 ticks per second
    assert_eq!(transport.position(), 3);

    transport.set_position(100);
    transport.advance(Duration::from_millis(1));
    assert_eq!(transport.position(), 100);
}

#[test]
fn unusable_tempo_is_ignored() {
    let mut transport = Transport::new(192, 120.0);
    transport.set_bpm(0.0);
    transport.set_bpm(f64::NAN);
    transport.set_bpm(-30.0);
    assert_eq!(transport.bpm(), 120.0);

    transport.set_bpm(60.0);
    assert_eq!(transport.bpm(), 60.0);
    assert_eq!(transport.ticks_per_second(), 192.0);
}

#[test]
fn milliseconds_to_ticks_follow_tempo() {
    let transport = Transport::new(192, 120.0);
    assert_eq!(transport.ms_to_ticks(25), 10);
    assert_eq!(transport.ms_to_ticks(-25), -10);
    assert_eq!(transport.ms_to_ticks(0), 0);
}
