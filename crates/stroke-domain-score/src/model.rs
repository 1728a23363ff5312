use stroke_ports::types::{NoteId, Tick};
use serde::{Deserialize, Serialize};

/// Resolution assumed when a score does not declare one.
pub const DEFAULT_SCORE_PPQ: u16 = 192;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoreMeta {
    pub title: Option<String>,
    pub source: ScoreSource,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreSource {
    Midi,
    Mei,
    Internal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meter {
    pub count: u32,
    pub unit: u32,
}

impl Default for Meter {
    fn default() -> Self {
        Self { count: 4, unit: 4 }
    }
}

impl Meter {
    /// Builds a meter from raw values, `None` when either part is unusable.
    pub fn new(count: u32, unit: u32) -> Option<Self> {
        (count > 0 && unit > 0).then_some(Self { count, unit })
    }

    pub fn ticks_per_measure(&self, ppq: u16) -> Tick {
        let ppq = ppq as i64;
        ppq * 4 * self.count as i64 / self.unit as i64
    }
}

/// One scored onset in the score's native tick domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub note: NoteId,
    pub track_index: u32,
    pub start_tick: Tick,
}

/// Flattened score as produced by the importers.
///
/// `events` are in score order: per track, time ordered, tracks in document order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoreDocument {
    pub meta: ScoreMeta,
    pub ppq: u16,
    pub meter: Meter,
    pub events: Vec<ScoreEvent>,
    /// Native tick where the piece ends (last measure or note end).
    pub end_tick: Tick,
}

impl ScoreDocument {
    pub fn new(meta: ScoreMeta, ppq: u16) -> Self {
        Self {
            meta,
            ppq,
            meter: Meter::default(),
            events: Vec::new(),
            end_tick: 0,
        }
    }
}
