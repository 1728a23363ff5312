use stroke_domain_score::ScoreTimeline;
use stroke_ports::storage::{MAX_HIT_TOLERANCE_TICKS, MIN_HIT_TOLERANCE_TICKS};
use stroke_ports::types::{NoteId, Tick};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    pub note: NoteId,
    pub target_tick: Tick,
    /// Played position minus scored onset; negative when early.
    pub delta: Tick,
}

/// Free-running matcher: a note-on counts when the same note is scored within
/// the tolerance of the transport position.
#[derive(Clone, Copy, Debug)]
pub struct ToleranceMatcher {
    tolerance: Tick,
}

impl Default for ToleranceMatcher {
    fn default() -> Self {
        Self::new(MAX_HIT_TOLERANCE_TICKS)
    }
}

impl ToleranceMatcher {
    pub fn new(tolerance: Tick) -> Self {
        Self {
            tolerance: tolerance.clamp(MIN_HIT_TOLERANCE_TICKS, MAX_HIT_TOLERANCE_TICKS),
        }
    }

    pub fn tolerance(&self) -> Tick {
        self.tolerance
    }

    pub fn set_tolerance(&mut self, tolerance: Tick) {
        *self = Self::new(tolerance);
    }

    /// Matches against the closest scored onset of `note`.
    pub fn on_note_on(&self, note: NoteId, position: Tick, timeline: &ScoreTimeline) -> Option<Hit> {
        timeline
            .entries_near(position, self.tolerance)
            .iter()
            .filter(|entry| entry.event.note == note)
            .min_by_key(|entry| (entry.tick - position).abs())
            .map(|entry| Hit {
                note,
                target_tick: entry.tick,
                delta: position - entry.tick,
            })
    }

    /// Notes the performer could hit right now.
    pub fn expected_notes(&self, position: Tick, timeline: &ScoreTimeline) -> Vec<NoteId> {
        timeline.notes_near(position, self.tolerance)
    }
}
