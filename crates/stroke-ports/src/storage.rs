use crate::transport::{EndOfPiece, PracticeMode};
use crate::types::*;
use serde::{Deserialize, Serialize};

pub const MIN_HIT_TOLERANCE_TICKS: Tick = 10;
pub const MAX_HIT_TOLERANCE_TICKS: Tick = 100;
/// Wider than this, neighbouring beats would merge into one chord gate.
pub const MAX_CHORD_EPSILON_TICKS: Tick = 96;

fn default_mode() -> PracticeMode {
    PracticeMode::Practice
}

fn default_end_of_piece() -> EndOfPiece {
    EndOfPiece::StopAndReset
}

fn default_tempo_bpm() -> f64 {
    120.0
}

fn default_hit_tolerance_ticks() -> Tick {
    MAX_HIT_TOLERANCE_TICKS
}

fn default_chord_epsilon_ticks() -> Tick {
    15
}

fn default_min_lookahead_ticks() -> Tick {
    24
}

fn default_lookahead_safety_factor() -> f64 {
    1.5
}

fn default_sampling_period_ms() -> u64 {
    50
}

fn default_feedback_hold_ms() -> u64 {
    1000
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serde(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDto {
    pub selected_midi_in: Option<DeviceId>,
    #[serde(default = "default_mode")]
    pub mode: PracticeMode,
    #[serde(default = "default_end_of_piece")]
    pub end_of_piece: EndOfPiece,
    #[serde(default = "default_tempo_bpm")]
    pub tempo_bpm: f64,
    /// Standard-mode half window around the transport position.
    #[serde(default = "default_hit_tolerance_ticks")]
    pub hit_tolerance_ticks: Tick,
    /// How far apart two onsets may be and still form one chord gate.
    #[serde(default = "default_chord_epsilon_ticks")]
    pub chord_epsilon_ticks: Tick,
    #[serde(default = "default_min_lookahead_ticks")]
    pub min_lookahead_ticks: Tick,
    #[serde(default = "default_lookahead_safety_factor")]
    pub lookahead_safety_factor: f64,
    #[serde(default = "default_sampling_period_ms")]
    pub sampling_period_ms: u64,
    #[serde(default = "default_feedback_hold_ms")]
    pub feedback_hold_ms: u64,
    pub input_offset_ms: i32,
}

impl Default for SettingsDto {
    fn default() -> Self {
        Self {
            selected_midi_in: None,
            mode: default_mode(),
            end_of_piece: default_end_of_piece(),
            tempo_bpm: default_tempo_bpm(),
            hit_tolerance_ticks: default_hit_tolerance_ticks(),
            chord_epsilon_ticks: default_chord_epsilon_ticks(),
            min_lookahead_ticks: default_min_lookahead_ticks(),
            lookahead_safety_factor: default_lookahead_safety_factor(),
            sampling_period_ms: default_sampling_period_ms(),
            feedback_hold_ms: default_feedback_hold_ms(),
            input_offset_ms: 0,
        }
    }
}

impl SettingsDto {
    /// Hit tolerance limited to the range standard mode accepts.
    pub fn clamped_hit_tolerance(&self) -> Tick {
        self.hit_tolerance_ticks
            .clamp(MIN_HIT_TOLERANCE_TICKS, MAX_HIT_TOLERANCE_TICKS)
    }

    pub fn clamped_chord_epsilon(&self) -> Tick {
        clamp_chord_epsilon(self.chord_epsilon_ticks)
    }
}

pub fn clamp_chord_epsilon(ticks: Tick) -> Tick {
    ticks.clamp(0, MAX_CHORD_EPSILON_TICKS)
}

pub trait StoragePort: Send + Sync {
    fn load_settings(&self) -> Result<SettingsDto, StorageError>;
    fn save_settings(&self, s: &SettingsDto) -> Result<(), StorageError>;
}
