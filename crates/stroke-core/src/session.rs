use crate::feedback::{Feedback, FeedbackKind, FeedbackSlot};
use crate::gate::{GateMachine, GateState};
use crate::scheduler::{Lookahead, LookaheadScheduler, SchedulerConfig};
use crate::seek::{SeekController, SeekOutcome};
use crate::transport::ms_to_ticks;
use stroke_domain_eval::{Gate, GateMatcher, HeldNotes, SatisfactionBarrier, ToleranceMatcher};
use stroke_domain_score::ScoreTimeline;
use stroke_ports::midi::PlayerEvent;
use stroke_ports::storage::SettingsDto;
use stroke_ports::transport::{EndOfPiece, PracticeMode, TransportPort};
use stroke_ports::types::{NoteId, Tick};
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub mode: PracticeMode,
    pub end_of_piece: EndOfPiece,
    pub scheduler: SchedulerConfig,
    pub hit_tolerance_ticks: Tick,
    pub input_offset_ms: i32,
    pub feedback_hold: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_settings(&SettingsDto::default())
    }
}

impl SessionConfig {
    pub fn from_settings(settings: &SettingsDto) -> Self {
        Self {
            mode: settings.mode,
            end_of_piece: settings.end_of_piece,
            scheduler: SchedulerConfig::from_settings(settings),
            hit_tolerance_ticks: settings.clamped_hit_tolerance(),
            input_offset_ms: settings.input_offset_ms,
            feedback_hold: Duration::from_millis(settings.feedback_hold_ms),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    GateOpened { tick: Tick, required: Vec<NoteId> },
    GateSatisfied { tick: Tick, notes: Vec<NoteId> },
    /// A pending gate was dropped by a seek or reset.
    GateCleared { tick: Tick },
    Feedback(Feedback),
    FeedbackCleared,
    Seeked { tick: Tick },
    EndOfPiece { behaviour: EndOfPiece, tick: Tick },
}

/// Everything one loaded piece needs to run: transport, timeline, gate state,
/// matchers and held keys.
///
/// The periodic sampler (`advance_clock` / `on_sample`) and device input
/// (`on_player_event`) both go through `&mut self`, so a gate can never be
/// opened and satisfied concurrently.
pub struct PracticeSession<T: TransportPort> {
    transport: T,
    mode: PracticeMode,
    end_of_piece: EndOfPiece,
    input_offset_ms: i32,
    scheduler: LookaheadScheduler,
    tolerance: ToleranceMatcher,
    matcher: GateMatcher,
    gates: GateMachine,
    seeker: SeekController,
    held: HeldNotes,
    feedback: FeedbackSlot,
    timeline: Option<ScoreTimeline>,
    /// Whether the user wants playback; a gate may still be holding the transport.
    playing: bool,
    expected: Vec<NoteId>,
    /// Every onset at or before this tick has been gated, consumed or skipped on purpose.
    searched_through: Tick,
    since_sample: Duration,
}

impl<T: TransportPort> PracticeSession<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            mode: config.mode,
            end_of_piece: config.end_of_piece,
            input_offset_ms: config.input_offset_ms,
            scheduler: LookaheadScheduler::new(config.scheduler),
            tolerance: ToleranceMatcher::new(config.hit_tolerance_ticks),
            matcher: GateMatcher::new(),
            gates: GateMachine::new(),
            seeker: SeekController::new(),
            held: HeldNotes::new(),
            feedback: FeedbackSlot::new(config.feedback_hold),
            timeline: None,
            playing: false,
            expected: Vec::new(),
            searched_through: -1,
            since_sample: Duration::ZERO,
        }
    }

    /// Arms the session with a fully built timeline, parked at tick 0.
    ///
    /// Inputs consumed under the previous piece are forgotten; keys still down stay held.
    pub fn load(&mut self, timeline: ScoreTimeline) -> Vec<SessionEvent> {
        info!(
            entries = timeline.len(),
            total_ticks = timeline.total_duration(),
            ratio = timeline.domain().ratio(),
            "score armed"
        );
        self.timeline = Some(timeline);
        self.rearm()
    }

    pub fn unload(&mut self) -> Vec<SessionEvent> {
        self.timeline = None;
        self.rearm()
    }

    fn rearm(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        self.playing = false;
        self.matcher.reset();
        self.since_sample = Duration::ZERO;
        if self.feedback.clear() {
            events.push(SessionEvent::FeedbackCleared);
        }
        let outcome = self
            .seeker
            .reset_to_start(&mut self.transport, &mut self.gates);
        self.land(outcome, &mut events);
        events
    }

    /// Moves the clock forward by wall time, sampling once per sampling period.
    ///
    /// Long steps are split at sample boundaries so the transport never travels
    /// more than one period between two samples.
    pub fn advance_clock(&mut self, elapsed: Duration, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        let period = self.scheduler.sampling_period();
        let mut remaining = elapsed;
        loop {
            let step = remaining.min(period.saturating_sub(self.since_sample));
            self.transport.advance(step);
            remaining -= step;
            self.since_sample += step;

            if let Some(event) = self.check_end_of_piece() {
                events.push(event);
            }
            if self.since_sample >= period {
                self.since_sample = Duration::ZERO;
                events.extend(self.on_sample(now));
            }
            if remaining.is_zero() {
                break;
            }
        }
        if self.feedback.expire(now) {
            events.push(SessionEvent::FeedbackCleared);
        }
        events
    }

    /// One scheduler sample. Does nothing while paused or gated.
    pub fn on_sample(&mut self, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if !self.transport.is_running() || self.gates.is_gated() {
            return events;
        }
        if let Some(event) = self.check_end_of_piece() {
            events.push(event);
            return events;
        }
        let Some(timeline) = self.timeline.as_ref() else {
            return events;
        };

        let position = self.transport.position();
        if self.mode == PracticeMode::Standard {
            self.expected = self.tolerance.expected_notes(position, timeline);
        }
        let decision = self.scheduler.sample(
            timeline,
            position,
            self.searched_through,
            self.transport.bpm(),
            self.transport.ppq(),
            self.mode == PracticeMode::Practice,
        );
        match decision {
            Lookahead::Gate(gate) => self.open_gate(gate, now, &mut events),
            // nothing owed up to here; standard mode lets onsets pass unclaimed
            Lookahead::Clear => self.searched_through = self.searched_through.max(position),
            Lookahead::EndOfPiece => {}
        }
        events
    }

    pub fn on_player_event(&mut self, event: PlayerEvent) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        let attack = self.held.apply(&event);

        if self.gates.is_gated() {
            self.evaluate_gate(event.at, &mut events);
            return events;
        }
        if self.mode != PracticeMode::Standard {
            return events;
        }
        let (Some(sample), Some(timeline)) = (attack, self.timeline.as_ref()) else {
            return events;
        };

        let offset = ms_to_ticks(
            self.input_offset_ms,
            self.transport.bpm(),
            self.transport.ppq(),
        );
        let played_at = self.transport.position() - offset;
        if let Some(hit) = self.tolerance.on_note_on(sample.note, played_at, timeline) {
            debug!(note = hit.note, target = hit.target_tick, delta = hit.delta, "hit");
            let feedback = Feedback {
                kind: FeedbackKind::Hit,
                notes: vec![hit.note],
                delta_ticks: Some(hit.delta),
            };
            self.feedback.show(feedback.clone(), event.at);
            events.push(SessionEvent::Feedback(feedback));
        }
        events
    }

    /// Seeks in transport ticks, clamped to the piece.
    pub fn seek(&mut self, tick: Tick) -> Vec<SessionEvent> {
        let total = self
            .timeline
            .as_ref()
            .map(|timeline| timeline.total_duration())
            .unwrap_or(0);
        let target = tick.clamp(0, total.max(0));
        let mut events = Vec::new();
        let outcome = self
            .seeker
            .seek(target, &mut self.transport, &mut self.gates);
        // a dropped gate was the only thing holding the transport
        if self.playing && !self.transport.is_running() {
            self.transport.start();
        }
        self.land(outcome, &mut events);
        events
    }

    /// Seeks in the score's own ticks; the lead-in is added here.
    pub fn seek_score(&mut self, score_tick: Tick) -> Vec<SessionEvent> {
        let tick = self
            .timeline
            .as_ref()
            .map(|timeline| timeline.domain().to_transport(score_tick))
            .unwrap_or(score_tick);
        self.seek(tick)
    }

    pub fn play(&mut self, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.timeline.is_none() {
            debug!("no score loaded, ignoring play");
            return events;
        }
        self.playing = true;
        if self.gates.is_gated() {
            debug!("gate is holding the transport");
            self.evaluate_gate(now, &mut events);
        } else {
            self.transport.start();
        }
        events
    }

    pub fn pause(&mut self) {
        self.playing = false;
        self.transport.pause();
    }

    pub fn stop(&mut self) -> Vec<SessionEvent> {
        self.playing = false;
        let mut events = Vec::new();
        let outcome = self
            .seeker
            .reset_to_start(&mut self.transport, &mut self.gates);
        self.land(outcome, &mut events);
        events
    }

    /// Switching never drops a pending gate.
    pub fn set_mode(&mut self, mode: PracticeMode) {
        self.mode = mode;
        self.refresh_expected();
    }

    pub fn set_end_of_piece(&mut self, behaviour: EndOfPiece) {
        self.end_of_piece = behaviour;
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        self.transport.set_bpm(bpm);
    }

    pub fn set_hit_tolerance(&mut self, ticks: Tick) {
        self.tolerance.set_tolerance(ticks);
        self.refresh_expected();
    }

    pub fn set_chord_epsilon(&mut self, ticks: Tick) {
        self.scheduler.set_chord_epsilon(ticks);
    }

    pub fn set_input_offset_ms(&mut self, ms: i32) {
        self.input_offset_ms = ms;
    }

    pub fn set_feedback_hold(&mut self, hold: Duration) {
        self.feedback.set_hold(hold);
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn position(&self) -> Tick {
        self.transport.position()
    }

    pub fn timeline(&self) -> Option<&ScoreTimeline> {
        self.timeline.as_ref()
    }

    pub fn gate_state(&self) -> &GateState {
        self.gates.state()
    }

    pub fn gate(&self) -> Option<&Gate> {
        self.gates.active()
    }

    pub fn is_gated(&self) -> bool {
        self.gates.is_gated()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn mode(&self) -> PracticeMode {
        self.mode
    }

    pub fn end_of_piece(&self) -> EndOfPiece {
        self.end_of_piece
    }

    pub fn barrier(&self) -> SatisfactionBarrier {
        self.matcher.barrier()
    }

    pub fn held_notes(&self) -> &HeldNotes {
        &self.held
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.current()
    }

    pub fn hit_tolerance(&self) -> Tick {
        self.tolerance.tolerance()
    }

    pub fn lookahead_window(&self) -> Tick {
        self.scheduler
            .dynamic_window(self.transport.bpm(), self.transport.ppq())
    }

    /// The gate's notes while waiting, otherwise the standard-mode expected notes.
    pub fn required_notes(&self) -> Vec<NoteId> {
        if self.gates.is_gated() {
            self.gates.required_notes()
        } else if self.mode == PracticeMode::Standard {
            self.expected.clone()
        } else {
            Vec::new()
        }
    }

    fn open_gate(&mut self, gate: Gate, now: Instant, events: &mut Vec<SessionEvent>) {
        let tick = gate.opened_at();
        let required = gate.required().iter().copied().collect();
        self.gates.open(gate, &mut self.transport);
        events.push(SessionEvent::GateOpened { tick, required });
        // keys already down may satisfy it straight away
        self.evaluate_gate(now, events);
    }

    fn evaluate_gate(&mut self, now: Instant, events: &mut Vec<SessionEvent>) {
        if !self.playing {
            return;
        }
        let Some(satisfaction) = self.matcher.evaluate(self.gates.active(), &self.held) else {
            return;
        };
        if let Some(gate) = self.gates.resume(&mut self.transport) {
            // humanized chord members grouped into this gate are not owed again
            self.searched_through = gate.span_end();
        }

        let feedback = Feedback {
            kind: FeedbackKind::Good,
            notes: satisfaction.notes.clone(),
            delta_ticks: None,
        };
        self.feedback.show(feedback.clone(), now);
        events.push(SessionEvent::GateSatisfied {
            tick: satisfaction.opened_at,
            notes: satisfaction.notes,
        });
        events.push(SessionEvent::Feedback(feedback));
    }

    fn check_end_of_piece(&mut self) -> Option<SessionEvent> {
        let timeline = self.timeline.as_ref()?;
        let total = timeline.total_duration();
        let first_playable = timeline.first_playable_tick();
        if !self.transport.is_running() || self.transport.position() < total {
            return None;
        }

        let ended_at = self.transport.position();
        let behaviour = if first_playable < total {
            self.end_of_piece
        } else {
            EndOfPiece::StopAndReset
        };
        let outcome = match behaviour {
            EndOfPiece::StopAndReset => {
                self.playing = false;
                self.seeker
                    .reset_to_start(&mut self.transport, &mut self.gates)
            }
            EndOfPiece::Loop => {
                self.seeker
                    .loop_to(first_playable, &mut self.transport, &mut self.gates)
            }
        };
        info!(ended_at, ?behaviour, "end of piece");
        let tick = outcome.tick;
        self.land(outcome, &mut Vec::new());
        Some(SessionEvent::EndOfPiece { behaviour, tick })
    }

    /// After any seek the onset under the new position is owed again.
    fn land(&mut self, outcome: SeekOutcome, events: &mut Vec<SessionEvent>) {
        self.searched_through = outcome.tick - 1;
        if let Some(gate) = outcome.cleared {
            events.push(SessionEvent::GateCleared {
                tick: gate.opened_at(),
            });
        }
        events.push(SessionEvent::Seeked { tick: outcome.tick });
        self.refresh_expected();
    }

    fn refresh_expected(&mut self) {
        self.expected = match (self.mode, self.timeline.as_ref()) {
            (PracticeMode::Standard, Some(timeline)) => self
                .tolerance
                .expected_notes(self.transport.position(), timeline),
            _ => Vec::new(),
        };
    }
}

