use midir::{Ignore, MidiInput, MidiInputConnection};
use stroke_ports::midi::{
    MidiError, MidiInputPort, MidiInputStream, MidiLikeEvent, PlayerEvent, PlayerEventCallback,
};
use stroke_ports::types::{DeviceId, MidiInputDevice};
use std::time::Instant;
use tracing::{debug, info};

const CLIENT_NAME: &str = "Stroke";

/// Decodes one raw message into the subset the trainer cares about.
///
/// Channel is ignored: drum kits and keyboards disagree on which one they use.
pub fn decode_message(message: &[u8]) -> Option<MidiLikeEvent> {
    let &[status, data1, data2, ..] = message else {
        return None;
    };
    match status & 0xF0 {
        0x80 => Some(MidiLikeEvent::NoteOff { note: data1 & 0x7F }),
        0x90 if data2 == 0 => Some(MidiLikeEvent::NoteOff { note: data1 & 0x7F }),
        0x90 => Some(MidiLikeEvent::NoteOn {
            note: data1 & 0x7F,
            velocity: data2 & 0x7F,
        }),
        0xB0 if data1 == 64 => Some(MidiLikeEvent::Cc64 { value: data2 & 0x7F }),
        _ => None,
    }
}

pub fn device_id(index: usize, name: &str) -> DeviceId {
    DeviceId(format!("midir:{index}:{name}"))
}

pub struct MidirMidiInputPort {
    client_name: String,
}

impl MidirMidiInputPort {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }

    fn create_midi_in(&self) -> Result<MidiInput, MidiError> {
        MidiInput::new(&self.client_name).map_err(|e| MidiError::Backend(e.to_string()))
    }

    /// Resolves a device by exact id, falling back to a case-insensitive name match.
    pub fn find_input(&self, query: &str) -> Result<MidiInputDevice, MidiError> {
        let devices = self.list_inputs()?;
        let needle = query.to_lowercase();
        devices
            .iter()
            .find(|device| device.id.0 == query)
            .or_else(|| {
                devices
                    .iter()
                    .find(|device| device.name.to_lowercase().contains(&needle))
            })
            .cloned()
            .ok_or_else(|| MidiError::DeviceNotFound(query.to_string()))
    }
}

impl Default for MidirMidiInputPort {
    fn default() -> Self {
        Self::new(CLIENT_NAME)
    }
}

pub struct MidirMidiInputStream {
    connection: Option<MidiInputConnection<PlayerEventCallback>>,
}

impl MidiInputStream for MidirMidiInputStream {
    fn close(mut self: Box<Self>) {
        if let Some(connection) = self.connection.take() {
            let _ = connection.close();
            debug!("midi input closed");
        }
    }
}

impl MidiInputPort for MidirMidiInputPort {
    fn list_inputs(&self) -> Result<Vec<MidiInputDevice>, MidiError> {
        let midi_in = self.create_midi_in()?;
        let devices = midi_in
            .ports()
            .iter()
            .enumerate()
            .map(|(index, port)| {
                let name = midi_in
                    .port_name(port)
                    .unwrap_or_else(|_| "Unknown Input".to_string());
                MidiInputDevice {
                    id: device_id(index, &name),
                    name,
                    is_available: true,
                }
            })
            .collect();
        Ok(devices)
    }

    fn open_input(
        &self,
        device_id: &DeviceId,
        cb: PlayerEventCallback,
    ) -> Result<Box<dyn MidiInputStream>, MidiError> {
        let mut midi_in = self.create_midi_in()?;
        // sysex, clock and active sensing are noise for note matching
        midi_in.ignore(Ignore::All);

        let port = midi_in
            .ports()
            .into_iter()
            .enumerate()
            .find(|(index, port)| {
                midi_in
                    .port_name(port)
                    .map(|name| &self::device_id(*index, &name) == device_id)
                    .unwrap_or(false)
            })
            .map(|(_, port)| port)
            .ok_or_else(|| MidiError::DeviceNotFound(device_id.to_string()))?;

        let connection = midi_in
            .connect(
                &port,
                "stroke-input",
                |_stamp, message, callback| {
                    if let Some(event) = decode_message(message) {
                        callback(PlayerEvent {
                            at: Instant::now(),
                            event,
                        });
                    }
                },
                cb,
            )
            .map_err(|e| MidiError::DeviceUnavailable(e.to_string()))?;
        info!(device = %device_id, "listening for input");

        Ok(Box::new(MidirMidiInputStream {
            connection: Some(connection),
        }))
    }
}
