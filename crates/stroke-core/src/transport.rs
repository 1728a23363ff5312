use stroke_ports::transport::TransportPort;
use stroke_ports::types::Tick;
use std::time::Duration;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Playing,
    Paused,
}

/// Software clock advanced by wall time at a fixed tempo.
#[derive(Clone, Debug)]
pub struct Transport {
    state: TransportState,
    ppq: u16,
    bpm: f64,
    position_tick: Tick,
    /// Fraction of a tick carried between advances so short steps never lose time.
    tick_remainder: f64,
}

impl Transport {
    pub fn new(ppq: u16, bpm: f64) -> Self {
        let mut transport = Self {
            state: TransportState::Stopped,
            ppq: ppq.max(1),
            bpm: 120.0,
            position_tick: 0,
            tick_remainder: 0.0,
        };
        transport.set_bpm(bpm);
        transport
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn ticks_per_second(&self) -> f64 {
        ticks_per_second(self.bpm, self.ppq)
    }

    pub fn ms_to_ticks(&self, ms: i32) -> Tick {
        ms_to_ticks(ms, self.bpm, self.ppq)
    }
}

impl TransportPort for Transport {
    fn start(&mut self) {
        self.state = TransportState::Playing;
    }

    fn pause(&mut self) {
        if self.state == TransportState::Playing {
            self.state = TransportState::Paused;
        }
    }

    fn is_running(&self) -> bool {
        self.state == TransportState::Playing
    }

    fn position(&self) -> Tick {
        self.position_tick
    }

    fn set_position(&mut self, tick: Tick) {
        self.position_tick = tick;
        self.tick_remainder = 0.0;
    }

    fn bpm(&self) -> f64 {
        self.bpm
    }

    fn set_bpm(&mut self, bpm: f64) {
        if !bpm.is_finite() || bpm <= 0.0 {
            warn!(bpm, "ignoring unusable tempo, keeping {}", self.bpm);
            return;
        }
        self.bpm = bpm;
    }

    fn ppq(&self) -> u16 {
        self.ppq
    }

    fn advance(&mut self, elapsed: Duration) {
        if self.state != TransportState::Playing {
            return;
        }
        let exact = elapsed.as_secs_f64() * self.ticks_per_second() + self.tick_remainder;
        let whole = exact.floor();
        self.tick_remainder = exact - whole;
        self.position_tick += whole as Tick;
    }
}

pub fn ticks_per_second(bpm: f64, ppq: u16) -> f64 {
    bpm / 60.0 * ppq as f64
}

/// Rounded to the nearest tick; negative offsets give negative ticks.
pub fn ms_to_ticks(ms: i32, bpm: f64, ppq: u16) -> Tick {
    (ms as f64 / 1000.0 * ticks_per_second(bpm, ppq)).round() as Tick
}
