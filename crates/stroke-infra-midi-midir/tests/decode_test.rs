use pretty_assertions::assert_eq;
use stroke_infra_midi_midir::{decode_message, device_id};
use stroke_ports::midi::MidiLikeEvent;
use stroke_ports::types::DeviceId;

#[test]
fn note_on_on_any_channel() {
    assert_eq!(
        decode_message(&[0x99, 38, 110]),
        Some(MidiLikeEvent::NoteOn {
            note: 38,
            velocity: 110
        })
    );
    assert_eq!(
        decode_message(&[0x90, 60, 1]),
        Some(MidiLikeEvent::NoteOn {
            note: 60,
            velocity: 1
        })
    );
}

#[test]
fn releases_and_sustain() {
    assert_eq!(
        decode_message(&[0x89, 38, 64]),
        Some(MidiLikeEvent::NoteOff { note: 38 })
    );
    assert_eq!(
        decode_message(&[0x90, 60, 0]),
        Some(MidiLikeEvent::NoteOff { note: 60 })
    );
    assert_eq!(
        decode_message(&[0xB0, 64, 127]),
        Some(MidiLikeEvent::Cc64 { value: 127 })
    );
}

#[test]
fn other_messages_are_dropped() {
    assert_eq!(decode_message(&[0xB0, 7, 100]), None);
    assert_eq!(decode_message(&[0xC0, 5]), None);
    assert_eq!(decode_message(&[0x90, 60]), None);
    assert_eq!(decode_message(&[]), None);
}

#[test]
fn device_ids_embed_index_and_name() {
    assert_eq!(
        device_id(2, "TD-17"),
        DeviceId("midir:2:TD-17".to_string())
    );
}
