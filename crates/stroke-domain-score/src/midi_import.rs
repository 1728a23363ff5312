use crate::model::{Meter, ScoreDocument, ScoreEvent, ScoreMeta, ScoreSource, DEFAULT_SCORE_PPQ};
use midly::{Fps, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use stroke_ports::types::Tick;
use std::path::Path;
use tracing::{debug, warn};

#[derive(thiserror::Error, Debug)]
pub enum MidiImportError {
    #[error("io error: {0}")]
    Io(String),
    #[error("parse error: {0}")]
    Parse(String),
}

pub fn import_midi_path(path: &Path) -> Result<ScoreDocument, MidiImportError> {
    let data = std::fs::read(path).map_err(|e| MidiImportError::Io(e.to_string()))?;
    import_midi_bytes(&data)
}

/// Every track with at least one note-on becomes one score track.
///
/// Note-ons with velocity 0 count as note-offs; they only extend the end tick.
pub fn import_midi_bytes(data: &[u8]) -> Result<ScoreDocument, MidiImportError> {
    let smf = Smf::parse(data).map_err(|e| MidiImportError::Parse(e.to_string()))?;
    let ppq = match smf.header.timing {
        Timing::Metrical(ticks) => ticks.as_int(),
        Timing::Timecode(fps, ticks_per_frame) => timecode_ppq(fps, ticks_per_frame),
    };
    let ppq = if ppq == 0 {
        warn!("MIDI header declares zero ticks per quarter, using {DEFAULT_SCORE_PPQ}");
        DEFAULT_SCORE_PPQ
    } else {
        ppq
    };

    let mut events: Vec<ScoreEvent> = Vec::new();
    let mut meter: Option<Meter> = None;
    let mut end_tick: Tick = 0;
    let mut track_index: u32 = 0;

    for track in &smf.tracks {
        let mut tick: Tick = 0;
        let mut has_notes = false;
        for event in track {
            tick += event.delta.as_int() as Tick;
            match &event.kind {
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { key, vel },
                    ..
                } => {
                    end_tick = end_tick.max(tick);
                    if vel.as_int() > 0 {
                        has_notes = true;
                        events.push(ScoreEvent {
                            note: key.as_int(),
                            track_index,
                            start_tick: tick,
                        });
                    }
                }
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOff { .. },
                    ..
                } => {
                    end_tick = end_tick.max(tick);
                }
                TrackEventKind::Meta(MetaMessage::TimeSignature(numerator, denominator_pow, _, _)) => {
                    if meter.is_none() {
                        let unit = 1u32.checked_shl(*denominator_pow as u32).unwrap_or(0);
                        meter = Meter::new(*numerator as u32, unit);
                    }
                }
                _ => {}
            }
        }
        if has_notes {
            track_index += 1;
        }
    }

    if meter.is_none() {
        debug!("MIDI file has no time signature, assuming 4/4");
    }
    let meter = meter.unwrap_or_default();

    // Dangling note-ons still sound for one beat.
    if let Some(last_start) = events.iter().map(|event| event.start_tick).max() {
        end_tick = end_tick.max(last_start + ppq as Tick);
    }

    Ok(ScoreDocument {
        meta: ScoreMeta {
            title: None,
            source: ScoreSource::Midi,
        },
        ppq,
        meter,
        events,
        end_tick,
    })
}

fn timecode_ppq(fps: Fps, ticks_per_frame: u8) -> u16 {
    // one second per quarter, as a 60 bpm stand-in
    let ticks_per_frame = ticks_per_frame.max(1) as u16;
    match fps {
        Fps::Fps24 => 24 * ticks_per_frame,
        Fps::Fps25 => 25 * ticks_per_frame,
        Fps::Fps29 | Fps::Fps30 => 30 * ticks_per_frame,
    }
}
