use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};
use stroke_domain_eval::{Gate, GateMatcher, HeldNotes, SatisfactionBarrier};
use stroke_domain_score::{ScoreEvent, ScoreTimeline, TickDomain};
use stroke_ports::midi::PlayerEvent;

fn ms(base: Instant, offset: u64) -> Instant {
    base + Duration::from_millis(offset)
}

#[test]
fn held_key_does_not_satisfy_the_next_identical_gate() {
    let t0 = Instant::now();
    let mut held = HeldNotes::new();
    let mut matcher = GateMatcher::new();

    let first = Gate::new([60], 192).expect("gate");
    held.apply(&PlayerEvent::note_on(60, 90, ms(t0, 10)));
    let satisfied = matcher.evaluate(Some(&first), &held).expect("fresh strike satisfies");
    assert_eq!(satisfied.notes, vec![60]);
    assert_eq!(satisfied.consumed_at, ms(t0, 10));

    // key never released
    let second = Gate::new([60], 384).expect("gate");
    assert_eq!(matcher.evaluate(Some(&second), &held), None);

    held.apply(&PlayerEvent::note_off(60, ms(t0, 400)));
    assert_eq!(matcher.evaluate(Some(&second), &held), None);

    held.apply(&PlayerEvent::note_on(60, 90, ms(t0, 450)));
    let satisfied = matcher.evaluate(Some(&second), &held).expect("restrike satisfies");
    assert_eq!(satisfied.opened_at, 384);
}

#[test]
fn chord_gate_needs_every_note_down() {
    let t0 = Instant::now();
    let mut held = HeldNotes::new();
    let mut matcher = GateMatcher::new();
    let gate = Gate::new([60, 64, 67], 192).expect("gate");

    held.apply(&PlayerEvent::note_on(60, 80, ms(t0, 0)));
    held.apply(&PlayerEvent::note_on(64, 80, ms(t0, 5)));
    assert_eq!(matcher.evaluate(Some(&gate), &held), None);

    held.apply(&PlayerEvent::note_on(67, 80, ms(t0, 12)));
    let satisfied = matcher.evaluate(Some(&gate), &held).expect("chord complete");
    assert_eq!(satisfied.notes, vec![60, 64, 67]);
    assert_eq!(satisfied.consumed_at, ms(t0, 12));
    assert_eq!(matcher.barrier().last(), Some(ms(t0, 12)));
}

#[test]
fn chord_gate_accepts_one_fresh_note_among_held_ones() {
    let t0 = Instant::now();
    let mut held = HeldNotes::new();
    let mut matcher = GateMatcher::new();

    held.apply(&PlayerEvent::note_on(36, 100, ms(t0, 0)));
    held.apply(&PlayerEvent::note_on(42, 100, ms(t0, 0)));
    let first = Gate::new([36, 42], 192).expect("gate");
    assert!(matcher.evaluate(Some(&first), &held).is_some());

    let second = Gate::new([36, 42], 288).expect("gate");
    assert_eq!(matcher.evaluate(Some(&second), &held), None);

    held.apply(&PlayerEvent::note_on(42, 100, ms(t0, 200)));
    assert!(matcher.evaluate(Some(&second), &held).is_some());
}

#[test]
fn no_gate_means_nothing_to_satisfy() {
    let mut held = HeldNotes::new();
    held.apply(&PlayerEvent::note_on(60, 100, Instant::now()));
    assert_eq!(GateMatcher::new().evaluate(None, &held), None);
    assert_eq!(Gate::new(Vec::<u8>::new(), 0), None);
}

#[test]
fn barrier_never_moves_backwards() {
    let t0 = Instant::now();
    let mut barrier = SatisfactionBarrier::new();
    assert!(barrier.is_fresh(t0));

    barrier.advance_to(ms(t0, 100));
    barrier.advance_to(ms(t0, 50));
    assert_eq!(barrier.last(), Some(ms(t0, 100)));
    assert!(!barrier.is_fresh(ms(t0, 100)));
    assert!(barrier.is_fresh(ms(t0, 101)));

    barrier.reset();
    assert_eq!(barrier.last(), None);
}

#[test]
fn releases_and_zero_velocity_drop_held_notes() {
    let t0 = Instant::now();
    let mut held = HeldNotes::new();

    assert!(held.apply(&PlayerEvent::note_on(60, 100, t0)).is_some());
    assert!(held.apply(&PlayerEvent::note_on(62, 100, t0)).is_some());
    assert_eq!(held.len(), 2);

    assert_eq!(held.apply(&PlayerEvent::note_on(60, 0, t0)), None);
    assert!(!held.contains(60));
    held.apply(&PlayerEvent::note_off(62, t0));
    assert!(held.is_empty());
}

#[test]
fn gate_groups_onsets_within_epsilon() {
    let events = [(60, 0), (64, 4), (67, 10), (72, 40)]
        .into_iter()
        .map(|(note, start_tick)| ScoreEvent {
            note,
            track_index: 0,
            start_tick,
        });
    let timeline = ScoreTimeline::from_events(events, TickDomain::new(192, 192), 192);

    let gate = Gate::around(&timeline, 192, 15).expect("gate");
    assert_eq!(gate.required().iter().copied().collect::<Vec<_>>(), vec![60, 64, 67]);
    assert_eq!(gate.opened_at(), 192);
    assert_eq!(gate.span_end(), 202);
    assert!(gate.is_chord());

    let gate = Gate::around(&timeline, 232, 15).expect("gate");
    assert!(!gate.is_chord());
    assert_eq!(gate.span_end(), 232);
}
