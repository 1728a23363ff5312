use crate::types::Tick;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PracticeMode {
    /// Free-running playback; hits are reported but never pause the transport.
    Standard,
    /// Playback waits at every scored note until the performer plays it.
    Practice,
}

/// What happens when the transport reaches the end of the loaded piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndOfPiece {
    StopAndReset,
    Loop,
}

/// Musical clock owned by the playback side.
///
/// The practice core reads it at any time but only moves the position through
/// seeks and gate transitions.
pub trait TransportPort {
    fn start(&mut self);
    fn pause(&mut self);
    fn is_running(&self) -> bool;

    fn position(&self) -> Tick;
    fn set_position(&mut self, tick: Tick);

    fn bpm(&self) -> f64;
    fn set_bpm(&mut self, bpm: f64);
    /// Ticks per quarter note of `position`.
    fn ppq(&self) -> u16;

    /// Lets the clock owner move time forward. No-op while paused.
    fn advance(&mut self, elapsed: Duration);
}
