use stroke_domain_score::ScoreTimeline;
use stroke_ports::types::{NoteId, Tick};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Notes the performer owes before the transport may move past `opened_at`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    required: BTreeSet<NoteId>,
    opened_at: Tick,
    /// Last onset folded into this gate by chord grouping.
    span_end: Tick,
}

impl Gate {
    /// `None` when there is nothing to wait for.
    pub fn new(required: impl IntoIterator<Item = NoteId>, opened_at: Tick) -> Option<Self> {
        let required: BTreeSet<NoteId> = required.into_iter().collect();
        if required.is_empty() {
            return None;
        }
        Some(Self {
            required,
            opened_at,
            span_end: opened_at,
        })
    }

    /// Groups every onset within `epsilon` ticks of `closest` into one gate.
    pub fn around(timeline: &ScoreTimeline, closest: Tick, epsilon: Tick) -> Option<Self> {
        let entries = timeline.entries_near(closest, epsilon);
        let span_end = entries.iter().map(|entry| entry.tick).max()?;
        let mut gate = Self::new(entries.iter().map(|entry| entry.event.note), closest)?;
        gate.span_end = span_end.max(closest);
        Some(gate)
    }

    pub fn required(&self) -> &BTreeSet<NoteId> {
        &self.required
    }

    pub fn opened_at(&self) -> Tick {
        self.opened_at
    }

    pub fn span_end(&self) -> Tick {
        self.span_end
    }

    pub fn is_chord(&self) -> bool {
        self.required.len() > 1
    }
}
