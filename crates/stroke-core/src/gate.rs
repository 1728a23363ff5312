use stroke_domain_eval::Gate;
use stroke_ports::transport::TransportPort;
use stroke_ports::types::NoteId;
use tracing::{debug, info};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum GateState {
    #[default]
    Running,
    Gated(Gate),
}

/// Single owner of the wait state. Opening pauses the transport on the gate's
/// onset; resuming clears it and moves one tick past the onset.
#[derive(Debug, Default)]
pub struct GateMachine {
    state: GateState,
}

impl GateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn active(&self) -> Option<&Gate> {
        match &self.state {
            GateState::Gated(gate) => Some(gate),
            GateState::Running => None,
        }
    }

    pub fn is_gated(&self) -> bool {
        matches!(self.state, GateState::Gated(_))
    }

    pub fn required_notes(&self) -> Vec<NoteId> {
        self.active()
            .map(|gate| gate.required().iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn open<T: TransportPort + ?Sized>(&mut self, gate: Gate, transport: &mut T) {
        if let GateState::Gated(current) = &self.state {
            debug!(at = current.opened_at(), "gate already open, ignoring");
            return;
        }
        transport.pause();
        transport.set_position(gate.opened_at());
        info!(at = gate.opened_at(), required = ?gate.required(), "waiting for input");
        self.state = GateState::Gated(gate);
    }

    /// Returns the resolved gate, `None` when nothing was pending.
    pub fn resume<T: TransportPort + ?Sized>(&mut self, transport: &mut T) -> Option<Gate> {
        let GateState::Gated(gate) = std::mem::take(&mut self.state) else {
            return None;
        };
        transport.set_position(transport.position() + 1);
        transport.start();
        info!(at = gate.opened_at(), "gate satisfied, resuming");
        Some(gate)
    }

    /// Drops any pending gate without touching the transport.
    pub fn force_clear(&mut self) -> Option<Gate> {
        match std::mem::take(&mut self.state) {
            GateState::Gated(gate) => {
                debug!(at = gate.opened_at(), "gate cleared");
                Some(gate)
            }
            GateState::Running => None,
        }
    }
}
