use crate::types::*;
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MidiLikeEvent {
    NoteOn {
        note: NoteId,
        velocity: u8,
    },
    NoteOff {
        note: NoteId,
    },
    /// CC64: value 0..127. Passed through, never matched against the score.
    Cc64 {
        value: u8,
    },
}

/// Raw performer input stamped with its arrival time on the monotonic clock.
#[derive(Clone, Copy, Debug)]
pub struct PlayerEvent {
    pub at: Instant,
    pub event: MidiLikeEvent,
}

/// One key attack as remembered while the key stays down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputSample {
    pub note: NoteId,
    pub velocity: u8,
    pub at: Instant,
}

impl PlayerEvent {
    pub fn note_on(note: NoteId, velocity: u8, at: Instant) -> Self {
        Self {
            at,
            event: MidiLikeEvent::NoteOn { note, velocity },
        }
    }

    pub fn note_off(note: NoteId, at: Instant) -> Self {
        Self {
            at,
            event: MidiLikeEvent::NoteOff { note },
        }
    }

    /// The attack carried by this event. A zero-velocity note-on is a release.
    pub fn attack(&self) -> Option<InputSample> {
        match self.event {
            MidiLikeEvent::NoteOn { note, velocity } if velocity > 0 => Some(InputSample {
                note,
                velocity,
                at: self.at,
            }),
            _ => None,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MidiError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// MIDI input stream handle: close stops the callbacks.
pub trait MidiInputStream: Send {
    fn close(self: Box<Self>);
}

pub type PlayerEventCallback = Arc<dyn Fn(PlayerEvent) + Send + Sync + 'static>;

pub trait MidiInputPort: Send + Sync {
    fn list_inputs(&self) -> Result<Vec<MidiInputDevice>, MidiError>;

    /// The callback runs on the backend's thread; it must not block.
    fn open_input(
        &self,
        device_id: &DeviceId,
        cb: PlayerEventCallback,
    ) -> Result<Box<dyn MidiInputStream>, MidiError>;
}
