use pretty_assertions::assert_eq;
use std::time::Duration;
use stroke_core::{Lookahead, LookaheadScheduler, SchedulerConfig};
use stroke_domain_score::{ScoreEvent, ScoreTimeline, TickDomain};
use stroke_ports::storage::{SettingsDto, MAX_CHORD_EPSILON_TICKS};

fn timeline(onsets: &[(u8, i64)], end: i64) -> ScoreTimeline {
    let events = onsets.iter().map(|&(note, start_tick)| ScoreEvent {
        note,
        track_index: 0,
        start_tick,
    });
    ScoreTimeline::from_events(events, TickDomain::new(192, 192), end)
}

#[test]
fn window_scales_with_tempo_and_has_a_floor() {
    let scheduler = LookaheadScheduler::new(SchedulerConfig::default());
    assert_eq!(scheduler.dynamic_window(120.0, 192), 29);
    assert_eq!(scheduler.dynamic_window(240.0, 192), 58);
    assert_eq!(scheduler.dynamic_window(60.0, 192), 24);
    assert_eq!(scheduler.dynamic_window(20.0, 192), 24);
}

#[test]
fn config_comes_from_settings() {
    let settings = SettingsDto {
        sampling_period_ms: 0,
        lookahead_safety_factor: f64::NAN,
        chord_epsilon_ticks: -4,
        ..SettingsDto::default()
    };
    let config = SchedulerConfig::from_settings(&settings);
    assert_eq!(config.sampling_period, Duration::from_millis(1));
    assert_eq!(config.safety_factor, 1.0);
    assert_eq!(config.chord_epsilon_ticks, 0);

    let wide = SchedulerConfig::from_settings(&SettingsDto {
        chord_epsilon_ticks: i64::MAX,
        ..SettingsDto::default()
    });
    assert_eq!(wide.chord_epsilon_ticks, MAX_CHORD_EPSILON_TICKS);

    let mut scheduler = LookaheadScheduler::new(SchedulerConfig::default());
    scheduler.set_chord_epsilon(i64::MAX);
    assert_eq!(scheduler.config().chord_epsilon_ticks, MAX_CHORD_EPSILON_TICKS);
}

#[test]
fn gate_opens_inside_the_window() {
    let scheduler = LookaheadScheduler::new(SchedulerConfig::default());
    let timeline = timeline(&[(60, 0), (64, 10), (67, 96)], 768);

    assert_eq!(
        scheduler.sample(&timeline, 100, 100, 120.0, 192, true),
        Lookahead::Clear
    );

    let Lookahead::Gate(gate) = scheduler.sample(&timeline, 170, 170, 120.0, 192, true) else {
        panic!("expected a gate");
    };
    assert_eq!(gate.opened_at(), 192);
    assert_eq!(gate.required().iter().copied().collect::<Vec<_>>(), vec![60, 64]);
    assert_eq!(gate.span_end(), 202);
}

#[test]
fn search_threshold_skips_consumed_onsets() {
    let scheduler = LookaheadScheduler::new(SchedulerConfig::default());
    let timeline = timeline(&[(60, 0), (64, 10), (67, 96)], 768);

    // resumed one tick after 192 with 202 already grouped into that gate
    assert_eq!(
        scheduler.sample(&timeline, 193, 202, 120.0, 192, true),
        Lookahead::Clear
    );
    // landed exactly on an onset after a seek
    let Lookahead::Gate(gate) = scheduler.sample(&timeline, 288, 287, 120.0, 192, true) else {
        panic!("expected a gate");
    };
    assert_eq!(gate.opened_at(), 288);
}

#[test]
fn end_of_piece_wins_and_standard_mode_never_gates() {
    let scheduler = LookaheadScheduler::new(SchedulerConfig::default());
    let timeline = timeline(&[(60, 0)], 768);

    assert_eq!(
        scheduler.sample(&timeline, 960, 960, 120.0, 192, true),
        Lookahead::EndOfPiece
    );
    assert_eq!(
        scheduler.sample(&timeline, 170, 170, 120.0, 192, false),
        Lookahead::Clear
    );
}
