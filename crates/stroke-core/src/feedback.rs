use stroke_ports::types::{NoteId, Tick};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackKind {
    /// Standard mode: a note-on landed inside the tolerance window.
    Hit,
    /// Practice mode: a gate was satisfied.
    Good,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub notes: Vec<NoteId>,
    pub delta_ticks: Option<Tick>,
}

/// Holds the latest feedback until it expires. A newer one replaces it.
#[derive(Debug)]
pub struct FeedbackSlot {
    hold: Duration,
    current: Option<(Feedback, Instant)>,
}

impl FeedbackSlot {
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            current: None,
        }
    }

    pub fn set_hold(&mut self, hold: Duration) {
        self.hold = hold;
    }

    pub fn show(&mut self, feedback: Feedback, now: Instant) {
        self.current = Some((feedback, now + self.hold));
    }

    pub fn current(&self) -> Option<&Feedback> {
        self.current.as_ref().map(|(feedback, _)| feedback)
    }

    /// True when something was showing and has now been cleared.
    pub fn expire(&mut self, now: Instant) -> bool {
        match &self.current {
            Some((_, until)) if now >= *until => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) -> bool {
        self.current.take().is_some()
    }
}
