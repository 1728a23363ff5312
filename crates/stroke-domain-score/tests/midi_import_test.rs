use midly::num::{u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use pretty_assertions::assert_eq;
use stroke_domain_score::{import_midi_bytes, Meter, ScoreEvent};

fn build_midi(ppq: u16, tracks: Vec<Vec<TrackEvent<'static>>>) -> Vec<u8> {
    let smf = Smf {
        header: Header {
            format: Format::Parallel,
            timing: Timing::Metrical(ppq.into()),
        },
        tracks,
    };
    let mut data = Vec::new();
    smf.write(&mut data).expect("midi write should succeed");
    data
}

fn note_on(delta: u32, key: u8, vel: u8) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            },
        },
    }
}

fn note_off(delta: u32, key: u8) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi {
            channel: u4::new(0),
            message: MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(64),
            },
        },
    }
}

fn end_of_track() -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    }
}

#[test]
fn midi_import_collects_onsets_per_track() {
    let conductor = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TimeSignature(3, 2, 24, 8)),
        },
        end_of_track(),
    ];
    let right = vec![
        note_on(0, 60, 100),
        note_on(0, 64, 100),
        note_off(480, 60),
        note_off(0, 64),
        note_on(0, 67, 90),
        note_off(480, 67),
        end_of_track(),
    ];
    let left = vec![note_on(0, 48, 80), note_off(960, 48), end_of_track()];

    let document = import_midi_bytes(&build_midi(480, vec![conductor, right, left]))
        .expect("import should succeed");

    assert_eq!(document.ppq, 480);
    assert_eq!(document.meter, Meter { count: 3, unit: 4 });
    assert_eq!(document.end_tick, 960);
    assert_eq!(
        document.events,
        vec![
            ScoreEvent { note: 60, track_index: 0, start_tick: 0 },
            ScoreEvent { note: 64, track_index: 0, start_tick: 0 },
            ScoreEvent { note: 67, track_index: 0, start_tick: 480 },
            ScoreEvent { note: 48, track_index: 1, start_tick: 0 },
        ]
    );
}

#[test]
fn midi_import_treats_zero_velocity_as_release() {
    let track = vec![note_on(0, 60, 100), note_on(240, 60, 0), end_of_track()];

    let document = import_midi_bytes(&build_midi(480, vec![track])).expect("import should succeed");

    assert_eq!(document.events.len(), 1);
    assert_eq!(document.meter, Meter::default());
}

#[test]
fn midi_import_extends_end_past_dangling_notes() {
    let track = vec![note_on(0, 60, 100), note_on(480, 62, 100), end_of_track()];

    let document = import_midi_bytes(&build_midi(480, vec![track])).expect("import should succeed");

    assert_eq!(document.end_tick, 960);
}

#[test]
fn midi_import_rejects_garbage() {
    assert!(import_midi_bytes(b"not a midi file").is_err());
}
