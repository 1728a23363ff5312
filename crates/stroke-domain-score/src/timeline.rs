use crate::model::{ScoreDocument, ScoreEvent};
use crate::ticks::TickDomain;
use stroke_ports::types::{NoteId, Tick};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimelineEntry {
    /// Onset in transport ticks.
    pub tick: Tick,
    pub event: ScoreEvent,
}

/// Immutable index of every scored onset of one loaded piece.
#[derive(Clone, Debug)]
pub struct ScoreTimeline {
    entries: Vec<TimelineEntry>,
    domain: TickDomain,
    total_duration: Tick,
}

impl ScoreTimeline {
    pub fn build(document: &ScoreDocument, transport_ppq: u16) -> Self {
        let domain = TickDomain::new(transport_ppq, document.ppq);
        Self::from_events(document.events.iter().copied(), domain, document.end_tick)
    }

    /// Entries are ordered by onset; events sharing an onset keep their input order.
    pub fn from_events(
        events: impl IntoIterator<Item = ScoreEvent>,
        domain: TickDomain,
        end_native_tick: Tick,
    ) -> Self {
        let mut events: Vec<ScoreEvent> = events.into_iter().collect();
        events.sort_by_key(|event| event.start_tick);

        let last_start = events.last().map(|event| event.start_tick).unwrap_or(0);
        let total_duration = domain.to_transport(end_native_tick.max(last_start));

        let entries = events
            .into_iter()
            .map(|event| TimelineEntry {
                tick: domain.to_transport(event.start_tick),
                event,
            })
            .collect();

        Self {
            entries,
            domain,
            total_duration,
        }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn domain(&self) -> TickDomain {
        self.domain
    }

    pub fn total_duration(&self) -> Tick {
        self.total_duration
    }

    /// First tick after the count-in.
    pub fn first_playable_tick(&self) -> Tick {
        self.domain.lead_in()
    }

    /// Nearest onset strictly after `tick`.
    pub fn next_onset_after(&self, tick: Tick) -> Option<Tick> {
        let idx = self.entries.partition_point(|entry| entry.tick <= tick);
        self.entries.get(idx).map(|entry| entry.tick)
    }

    /// Entries whose onset lies within `radius` of `center`, in timeline order.
    pub fn entries_near(&self, center: Tick, radius: Tick) -> &[TimelineEntry] {
        let radius = radius.max(0);
        let start = self
            .entries
            .partition_point(|entry| entry.tick < center.saturating_sub(radius));
        let end = self
            .entries
            .partition_point(|entry| entry.tick <= center.saturating_add(radius));
        &self.entries[start..end.max(start)]
    }

    /// Distinct notes within `radius` of `center`, first occurrence order.
    pub fn notes_near(&self, center: Tick, radius: Tick) -> Vec<NoteId> {
        let mut notes = Vec::new();
        for entry in self.entries_near(center, radius) {
            if !notes.contains(&entry.event.note) {
                notes.push(entry.event.note);
            }
        }
        notes
    }
}
