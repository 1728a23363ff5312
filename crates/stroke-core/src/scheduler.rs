use stroke_domain_eval::Gate;
use stroke_domain_score::ScoreTimeline;
use stroke_ports::storage::{clamp_chord_epsilon, SettingsDto};
use stroke_ports::types::Tick;
use std::time::Duration;

const MIN_SAMPLING_PERIOD: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerConfig {
    pub sampling_period: Duration,
    /// Multiplier over one period's worth of ticks, so a sample never steps over an onset.
    pub safety_factor: f64,
    pub min_window_ticks: Tick,
    pub chord_epsilon_ticks: Tick,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_settings(&SettingsDto::default())
    }
}

impl SchedulerConfig {
    pub fn from_settings(settings: &SettingsDto) -> Self {
        Self {
            sampling_period: Duration::from_millis(settings.sampling_period_ms)
                .max(MIN_SAMPLING_PERIOD),
            safety_factor: if settings.lookahead_safety_factor.is_finite() {
                settings.lookahead_safety_factor.max(1.0)
            } else {
                1.0
            },
            min_window_ticks: settings.min_lookahead_ticks.max(1),
            chord_epsilon_ticks: settings.clamped_chord_epsilon(),
        }
    }
}

/// What one sample of the transport decided.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookahead {
    Clear,
    EndOfPiece,
    Gate(Gate),
}

#[derive(Clone, Debug)]
pub struct LookaheadScheduler {
    config: SchedulerConfig,
}

impl LookaheadScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn set_chord_epsilon(&mut self, ticks: Tick) {
        self.config.chord_epsilon_ticks = clamp_chord_epsilon(ticks);
    }

    pub fn sampling_period(&self) -> Duration {
        self.config.sampling_period
    }

    /// Lookahead distance in ticks, scaled with the tempo.
    pub fn dynamic_window(&self, bpm: f64, ppq: u16) -> Tick {
        let ticks_per_period =
            bpm / 60.0 * ppq as f64 * self.config.sampling_period.as_secs_f64();
        let scaled = (ticks_per_period * self.config.safety_factor).ceil();
        let scaled = if scaled.is_finite() { scaled as Tick } else { 0 };
        scaled.max(self.config.min_window_ticks)
    }

    /// End of piece, or the gate owed by the next onset strictly after `search_after`.
    ///
    /// Onsets up to `search_after` are already accounted for. An owed onset the
    /// transport has already passed still gates, and the gate snaps back to it.
    pub fn sample(
        &self,
        timeline: &ScoreTimeline,
        position: Tick,
        search_after: Tick,
        bpm: f64,
        ppq: u16,
        gating: bool,
    ) -> Lookahead {
        if position >= timeline.total_duration() {
            return Lookahead::EndOfPiece;
        }
        if !gating {
            return Lookahead::Clear;
        }
        let Some(closest) = timeline.next_onset_after(search_after) else {
            return Lookahead::Clear;
        };
        if closest - position >= self.dynamic_window(bpm, ppq) {
            return Lookahead::Clear;
        }
        Gate::around(timeline, closest, self.config.chord_epsilon_ticks)
            .map(Lookahead::Gate)
            .unwrap_or(Lookahead::Clear)
    }
}
