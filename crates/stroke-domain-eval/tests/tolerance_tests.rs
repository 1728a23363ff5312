use pretty_assertions::assert_eq;
use stroke_domain_eval::{Hit, ToleranceMatcher};
use stroke_domain_score::{ScoreEvent, ScoreTimeline, TickDomain};

fn timeline(onsets: &[(u8, i64)]) -> ScoreTimeline {
    let events = onsets.iter().map(|&(note, start_tick)| ScoreEvent {
        note,
        track_index: 0,
        start_tick,
    });
    ScoreTimeline::from_events(events, TickDomain::new(192, 192), 768)
}

#[test]
fn matches_the_closest_onset_of_the_same_note() {
    let timeline = timeline(&[(38, 0), (38, 96), (36, 96)]);
    let matcher = ToleranceMatcher::new(100);

    assert_eq!(
        matcher.on_note_on(38, 270, &timeline),
        Some(Hit {
            note: 38,
            target_tick: 288,
            delta: -18,
        })
    );
    assert_eq!(
        matcher.on_note_on(36, 300, &timeline),
        Some(Hit {
            note: 36,
            target_tick: 288,
            delta: 12,
        })
    );
}

#[test]
fn notes_outside_the_window_miss() {
    let timeline = timeline(&[(60, 0)]);
    let matcher = ToleranceMatcher::new(10);

    assert_eq!(matcher.on_note_on(60, 203, &timeline).map(|hit| hit.delta), None);
    assert_eq!(matcher.on_note_on(60, 200, &timeline).map(|hit| hit.delta), Some(8));
    assert_eq!(matcher.on_note_on(61, 192, &timeline), None);
}

#[test]
fn tolerance_is_clamped() {
    assert_eq!(ToleranceMatcher::new(0).tolerance(), 10);
    assert_eq!(ToleranceMatcher::new(500).tolerance(), 100);
    assert_eq!(ToleranceMatcher::default().tolerance(), 100);

    let mut matcher = ToleranceMatcher::new(50);
    matcher.set_tolerance(5);
    assert_eq!(matcher.tolerance(), 10);
}

#[test]
fn expected_notes_follow_the_position() {
    let timeline = timeline(&[(36, 0), (42, 0), (38, 192), (42, 192)]);
    let matcher = ToleranceMatcher::new(20);

    assert_eq!(matcher.expected_notes(190, &timeline), vec![36, 42]);
    assert_eq!(matcher.expected_notes(288, &timeline), Vec::<u8>::new());
    assert_eq!(matcher.expected_notes(380, &timeline), vec![38, 42]);
}
