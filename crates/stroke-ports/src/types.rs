use serde::{Deserialize, Serialize};
use std::fmt;

pub type Tick = i64; // transport or score ticks, see TickDomain for the mapping
pub type NoteId = u8; // MIDI pitch, or General MIDI percussion number for drum kits

/// Transport resolution in ticks per quarter note.
pub const TRANSPORT_PPQ: u16 = 192;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub String);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MidiInputDevice {
    pub id: DeviceId,
    pub name: String,
    pub is_available: bool,
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
