use crate::ipc::{Command, Event, ScoreSource, SessionState};
use crate::session::{PracticeSession, SessionConfig, SessionEvent};
use crate::transport::Transport;
use parking_lot::Mutex;
use rtrb::{Consumer, RingBuffer};
use stroke_domain_score::{
    import_mei_path, import_midi_path, NoteLabeling, ScoreDocument, ScoreTimeline,
};
use stroke_ports::midi::{MidiError, MidiInputPort, MidiInputStream, PlayerEvent};
use stroke_ports::storage::{clamp_chord_epsilon, SettingsDto, StorageError, StoragePort};
use stroke_ports::transport::TransportPort;
use stroke_ports::types::{DeviceId, NoteId, TRANSPORT_PPQ};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const TRANSPORT_EMIT_INTERVAL: Duration = Duration::from_millis(33);

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("midi error: {0}")]
    Midi(#[from] MidiError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("score load failed: {0}")]
    ScoreLoad(String),
}

pub struct AppCore {
    midi_port: Box<dyn MidiInputPort>,
    storage: Option<Box<dyn StoragePort>>,
    settings: SettingsDto,
    session: PracticeSession<Transport>,
    midi_stream: Option<Box<dyn MidiInputStream>>,
    midi_queue_rx: Option<Consumer<PlayerEvent>>,
    events: VecDeque<Event>,
    last_tick: Option<Instant>,
    last_transport_emit: Option<Instant>,
    last_state: Option<SessionState>,
    last_required: Vec<NoteId>,
}

impl AppCore {
    pub fn new(
        midi_port: Box<dyn MidiInputPort>,
        storage: Option<Box<dyn StoragePort>>,
    ) -> Result<Self, AppError> {
        let settings = match storage.as_ref().map(|storage| storage.load_settings()) {
            Some(Ok(settings)) => settings,
            Some(Err(err)) => {
                warn!(%err, "could not load settings, using defaults");
                SettingsDto::default()
            }
            None => SettingsDto::default(),
        };

        let transport = Transport::new(TRANSPORT_PPQ, settings.tempo_bpm);
        let session = PracticeSession::new(transport, SessionConfig::from_settings(&settings));

        Ok(Self {
            midi_port,
            storage,
            settings,
            session,
            midi_stream: None,
            midi_queue_rx: None,
            events: VecDeque::new(),
            last_tick: None,
            last_transport_emit: None,
            last_state: None,
            last_required: Vec::new(),
        })
    }

    pub fn handle_command(&mut self, cmd: Command) -> Result<(), AppError> {
        self.handle_command_at(cmd, Instant::now())
    }

    pub fn handle_command_at(&mut self, cmd: Command, now: Instant) -> Result<(), AppError> {
        match cmd {
            Command::ListMidiInputs => {
                let devices = self.midi_port.list_inputs()?;
                self.events.push_back(Event::MidiInputsUpdated { devices });
            }
            Command::SelectMidiInput { device_id } => {
                self.open_midi_input(device_id)?;
            }
            Command::LoadScore { source } => {
                self.load_score(source)?;
            }
            Command::UnloadScore => {
                let events = self.session.unload();
                self.forward(events, now);
            }
            Command::Play => {
                let events = self.session.play(now);
                self.forward(events, now);
                self.emit_transport(now, true);
            }
            Command::Pause => {
                self.session.pause();
                self.emit_transport(now, true);
            }
            Command::Stop => {
                let events = self.session.stop();
                self.forward(events, now);
            }
            Command::Seek { tick } => {
                let events = self.session.seek(tick);
                self.forward(events, now);
            }
            Command::SeekScore { score_tick } => {
                let events = self.session.seek_score(score_tick);
                self.forward(events, now);
            }
            Command::SetMode { mode } => {
                self.settings.mode = mode;
                self.session.set_mode(mode);
                self.settings_changed();
            }
            Command::SetEndOfPiece { behaviour } => {
                self.settings.end_of_piece = behaviour;
                self.session.set_end_of_piece(behaviour);
                self.settings_changed();
            }
            Command::SetTempo { bpm } => {
                self.session.set_bpm(bpm);
                self.settings.tempo_bpm = self.session.transport().bpm();
                self.settings_changed();
                self.emit_transport(now, true);
            }
            Command::SetHitTolerance { ticks } => {
                self.settings.hit_tolerance_ticks = ticks;
                self.session
                    .set_hit_tolerance(self.settings.clamped_hit_tolerance());
                self.settings_changed();
            }
            Command::SetChordEpsilon { ticks } => {
                self.settings.chord_epsilon_ticks = clamp_chord_epsilon(ticks);
                self.session
                    .set_chord_epsilon(self.settings.chord_epsilon_ticks);
                self.settings_changed();
            }
            Command::SetInputOffsetMs { ms } => {
                self.settings.input_offset_ms = ms;
                self.session.set_input_offset_ms(ms);
                self.settings_changed();
            }
            Command::SetFeedbackHoldMs { ms } => {
                self.settings.feedback_hold_ms = ms;
                self.session.set_feedback_hold(Duration::from_millis(ms));
                self.settings_changed();
            }
        }
        self.sync_ui();
        Ok(())
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Drains device input, then moves the clock by the time since the last tick.
    pub fn tick_at(&mut self, now: Instant) {
        self.process_midi_inputs(now);
        let elapsed = self
            .last_tick
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_tick = Some(now);

        let events = self.session.advance_clock(elapsed, now);
        self.forward(events, now);
        self.emit_transport(now, false);
        self.sync_ui();
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    pub fn session(&self) -> &PracticeSession<Transport> {
        &self.session
    }

    pub fn settings(&self) -> &SettingsDto {
        &self.settings
    }

    pub fn session_state(&self) -> SessionState {
        if self.session.timeline().is_none() {
            SessionState::Idle
        } else if self.session.is_gated() && self.session.is_playing() {
            SessionState::Waiting
        } else if self.session.is_playing() {
            SessionState::Running
        } else if self.session.position() == 0 {
            SessionState::Ready
        } else {
            SessionState::Paused
        }
    }

    fn open_midi_input(&mut self, device_id: DeviceId) -> Result<(), AppError> {
        if let Some(stream) = self.midi_stream.take() {
            stream.close();
        }

        let (producer, consumer) = RingBuffer::new(2048);
        let producer = Arc::new(Mutex::new(producer));
        let cb = Arc::new(move |event: PlayerEvent| {
            // never block the backend thread; a contended or full ring drops the event
            if let Some(mut guard) = producer.try_lock() {
                let _ = guard.push(event);
            }
        });

        let stream = self.midi_port.open_input(&device_id, cb)?;
        info!(device = %device_id, "midi input opened");
        self.midi_stream = Some(stream);
        self.midi_queue_rx = Some(consumer);
        self.settings.selected_midi_in = Some(device_id);
        self.settings_changed();
        Ok(())
    }

    fn load_score(&mut self, source: ScoreSource) -> Result<(), AppError> {
        let document = read_score(&source)?;
        let timeline = ScoreTimeline::build(&document, self.session.transport().ppq());
        self.events.push_back(Event::ScoreLoaded {
            title: document.meta.title.clone(),
            events: timeline.len(),
            total_ticks: timeline.total_duration(),
            score_ppq: document.ppq,
        });
        let events = self.session.load(timeline);
        self.forward(events, Instant::now());
        Ok(())
    }

    fn process_midi_inputs(&mut self, now: Instant) {
        let Some(mut consumer) = self.midi_queue_rx.take() else {
            return;
        };

        let mut pending = Vec::new();
        while let Ok(event) = consumer.pop() {
            pending.push(event);
        }
        self.midi_queue_rx = Some(consumer);

        for event in pending {
            let events = self.session.on_player_event(event);
            self.forward(events, now);
        }
    }

    fn forward(&mut self, events: Vec<SessionEvent>, now: Instant) {
        let mut moved = false;
        for event in events {
            match event {
                SessionEvent::Feedback(feedback) => {
                    self.events.push_back(Event::Feedback {
                        kind: feedback.kind,
                        notes: feedback.notes,
                        delta_ticks: feedback.delta_ticks,
                    });
                }
                SessionEvent::FeedbackCleared => {
                    self.events.push_back(Event::FeedbackCleared);
                }
                SessionEvent::EndOfPiece { behaviour, .. } => {
                    self.events.push_back(Event::PieceEnded { behaviour });
                    moved = true;
                }
                SessionEvent::GateOpened { .. }
                | SessionEvent::GateSatisfied { .. }
                | SessionEvent::GateCleared { .. }
                | SessionEvent::Seeked { .. } => {
                    moved = true;
                }
            }
        }
        if moved {
            self.emit_transport(now, true);
        }
    }

    fn sync_ui(&mut self) {
        let state = self.session_state();
        if self.last_state != Some(state) {
            self.last_state = Some(state);
            self.emit_session_state(state);
        }
        let required = self.session.required_notes();
        if required != self.last_required {
            self.last_required = required.clone();
            self.events
                .push_back(Event::RequiredNotesUpdated { notes: required });
        }
    }

    fn emit_session_state(&mut self, state: SessionState) {
        self.events.push_back(Event::SessionStateUpdated {
            state,
            settings: self.settings.clone(),
        });
    }

    fn emit_transport(&mut self, now: Instant, force: bool) {
        if !force {
            if let Some(last) = self.last_transport_emit {
                if now.saturating_duration_since(last) < TRANSPORT_EMIT_INTERVAL {
                    return;
                }
            }
        }
        self.events.push_back(Event::TransportUpdated {
            tick: self.session.position(),
            playing: self.session.transport().is_running(),
            gated: self.session.is_gated(),
            bpm: self.session.transport().bpm(),
        });
        self.last_transport_emit = Some(now);
    }

    fn settings_changed(&mut self) {
        let state = self.session_state();
        self.last_state = Some(state);
        self.emit_session_state(state);
        self.save_settings();
    }

    fn save_settings(&self) {
        if let Some(storage) = self.storage.as_ref() {
            if let Err(err) = storage.save_settings(&self.settings) {
                warn!(%err, "could not save settings");
            }
        }
    }
}

fn read_score(source: &ScoreSource) -> Result<ScoreDocument, AppError> {
    let document = match source {
        ScoreSource::MidiFile(path) => import_midi_path(Path::new(path))
            .map_err(|e| AppError::ScoreLoad(e.to_string()))?,
        ScoreSource::MeiFile { path, drums } => {
            let labeling = if *drums {
                NoteLabeling::drums()
            } else {
                NoteLabeling::Pitched
            };
            import_mei_path(Path::new(path), &labeling)
                .map_err(|e| AppError::ScoreLoad(e.to_string()))?
        }
    };
    debug!(
        events = document.events.len(),
        ppq = document.ppq,
        "score document read"
    );
    Ok(document)
}
