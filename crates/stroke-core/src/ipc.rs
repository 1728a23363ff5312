use crate::feedback::FeedbackKind;
use stroke_ports::storage::SettingsDto;
use stroke_ports::transport::{EndOfPiece, PracticeMode};
use stroke_ports::types::{DeviceId, MidiInputDevice, NoteId, Tick};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ScoreSource {
    MidiFile(String),
    /// `drums` selects the drum-kit notehead map instead of pitch spelling.
    MeiFile { path: String, drums: bool },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Command {
    ListMidiInputs,
    SelectMidiInput { device_id: DeviceId },
    LoadScore { source: ScoreSource },
    UnloadScore,
    Play,
    Pause,
    Stop,
    Seek { tick: Tick },
    SeekScore { score_tick: Tick },
    SetMode { mode: PracticeMode },
    SetEndOfPiece { behaviour: EndOfPiece },
    SetTempo { bpm: f64 },
    SetHitTolerance { ticks: Tick },
    SetChordEpsilon { ticks: Tick },
    SetInputOffsetMs { ms: i32 },
    /// How long hit and good feedback stays up.
    SetFeedbackHoldMs { ms: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Ready,
    Running,
    /// Transport held by a gate until the performer plays the required notes.
    Waiting,
    Paused,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    MidiInputsUpdated { devices: Vec<MidiInputDevice> },
    SessionStateUpdated { state: SessionState, settings: SettingsDto },
    ScoreLoaded {
        title: Option<String>,
        events: usize,
        total_ticks: Tick,
        score_ppq: u16,
    },
    TransportUpdated {
        tick: Tick,
        playing: bool,
        gated: bool,
        bpm: f64,
    },
    RequiredNotesUpdated { notes: Vec<NoteId> },
    Feedback {
        kind: FeedbackKind,
        notes: Vec<NoteId>,
        delta_ticks: Option<Tick>,
    },
    FeedbackCleared,
    PieceEnded { behaviour: EndOfPiece },
}
