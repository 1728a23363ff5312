use stroke_ports::midi::{InputSample, MidiLikeEvent, PlayerEvent};
use stroke_ports::types::NoteId;
use std::collections::HashMap;

/// Keys currently down, each with the attack that pressed it.
#[derive(Clone, Debug, Default)]
pub struct HeldNotes {
    notes: HashMap<NoteId, InputSample>,
}

impl HeldNotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one input event in and returns the attack it carried, if any.
    ///
    /// A repeated note-on replaces the stored sample so the newest attack wins.
    pub fn apply(&mut self, event: &PlayerEvent) -> Option<InputSample> {
        if let Some(sample) = event.attack() {
            self.notes.insert(sample.note, sample);
            return Some(sample);
        }
        match event.event {
            MidiLikeEvent::NoteOn { note, .. } | MidiLikeEvent::NoteOff { note } => {
                self.notes.remove(&note);
            }
            MidiLikeEvent::Cc64 { .. } => {}
        }
        None
    }

    pub fn get(&self, note: NoteId) -> Option<&InputSample> {
        self.notes.get(&note)
    }

    pub fn contains(&self, note: NoteId) -> bool {
        self.notes.contains_key(&note)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputSample> {
        self.notes.values()
    }
}
