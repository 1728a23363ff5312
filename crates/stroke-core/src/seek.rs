use crate::gate::GateMachine;
use stroke_domain_eval::Gate;
use stroke_ports::transport::TransportPort;
use stroke_ports::types::Tick;
use tracing::info;

/// The only writer of the transport position outside gate transitions.
#[derive(Debug, Default)]
pub struct SeekController;

#[derive(Debug)]
pub struct SeekOutcome {
    pub tick: Tick,
    pub cleared: Option<Gate>,
}

impl SeekController {
    pub fn new() -> Self {
        Self
    }

    /// Moves to `tick` and drops any pending gate. Running state is left alone.
    pub fn seek<T: TransportPort + ?Sized>(
        &self,
        tick: Tick,
        transport: &mut T,
        gates: &mut GateMachine,
    ) -> SeekOutcome {
        let cleared = gates.force_clear();
        transport.set_position(tick);
        info!(tick, "seek");
        SeekOutcome { tick, cleared }
    }

    pub fn reset_to_start<T: TransportPort + ?Sized>(
        &self,
        transport: &mut T,
        gates: &mut GateMachine,
    ) -> SeekOutcome {
        transport.pause();
        self.seek(0, transport, gates)
    }

    /// Jumps back to the first playable tick and keeps running.
    pub fn loop_to<T: TransportPort + ?Sized>(
        &self,
        first_playable: Tick,
        transport: &mut T,
        gates: &mut GateMachine,
    ) -> SeekOutcome {
        self.seek(first_playable, transport, gates)
    }
}
