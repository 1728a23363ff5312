use crate::gate::Gate;
use crate::held::HeldNotes;
use stroke_ports::types::{NoteId, Tick};
use std::time::Instant;

/// Timestamp of the newest input already spent on a gate.
///
/// Only inputs strictly newer than the barrier may satisfy the next gate, so a key
/// that stays down across two identical gates counts once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SatisfactionBarrier {
    last: Option<Instant>,
}

impl SatisfactionBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<Instant> {
        self.last
    }

    pub fn is_fresh(&self, at: Instant) -> bool {
        self.last.map_or(true, |barrier| at > barrier)
    }

    /// Never moves backwards.
    pub fn advance_to(&mut self, at: Instant) {
        self.last = Some(self.last.map_or(at, |barrier| barrier.max(at)));
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Satisfaction {
    pub notes: Vec<NoteId>,
    pub opened_at: Tick,
    /// Newest contributing attack; the barrier now sits here.
    pub consumed_at: Instant,
}

/// Decides whether the held keys release the active gate.
#[derive(Debug, Default)]
pub struct GateMatcher {
    barrier: SatisfactionBarrier,
}

impl GateMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn barrier(&self) -> SatisfactionBarrier {
        self.barrier
    }

    /// Forgets every consumed input. Used when a different piece is loaded.
    pub fn reset(&mut self) {
        self.barrier.reset();
    }

    /// Every required note must be held and at least one attack must be newer than
    /// the barrier. For a single-note gate that means a fresh strike of that note.
    pub fn evaluate(&mut self, gate: Option<&Gate>, held: &HeldNotes) -> Option<Satisfaction> {
        let gate = gate?;
        let mut newest: Option<Instant> = None;
        for note in gate.required() {
            let sample = held.get(*note)?;
            newest = Some(newest.map_or(sample.at, |at| at.max(sample.at)));
        }
        let newest = newest?;
        if !self.barrier.is_fresh(newest) {
            return None;
        }

        self.barrier.advance_to(newest);
        Some(Satisfaction {
            notes: gate.required().iter().copied().collect(),
            opened_at: gate.opened_at(),
            consumed_at: newest,
        })
    }
}
