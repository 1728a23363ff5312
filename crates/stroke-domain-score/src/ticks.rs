use stroke_ports::types::Tick;
use tracing::warn;

/// Mapping between the score's native ticks and transport ticks.
///
/// Every comparison between a transport position and a scored onset goes
/// through [`TickDomain::to_transport`]; nothing else scales score ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickDomain {
    ratio: f64,
    lead_in: Tick,
}

impl TickDomain {
    /// Ratio `transport_ppq / score_ppq` with a one-quarter count-in.
    pub fn new(transport_ppq: u16, score_ppq: u16) -> Self {
        let ratio = if score_ppq == 0 {
            f64::NAN
        } else {
            transport_ppq as f64 / score_ppq as f64
        };
        Self::from_ratio(ratio, transport_ppq as Tick)
    }

    /// Zero, negative or non-finite ratios fall back to 1.
    pub fn from_ratio(ratio: f64, lead_in: Tick) -> Self {
        let ratio = if ratio.is_finite() && ratio > 0.0 {
            ratio
        } else {
            warn!(ratio, "unusable tick resolution ratio, falling back to 1");
            1.0
        };
        Self {
            ratio,
            lead_in: lead_in.max(0),
        }
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn lead_in(&self) -> Tick {
        self.lead_in
    }

    pub fn to_transport(&self, native_tick: Tick) -> Tick {
        (native_tick as f64 * self.ratio).round() as Tick + self.lead_in
    }

    /// Inverse of `to_transport`, used when a caller seeks in score coordinates.
    pub fn to_score(&self, transport_tick: Tick) -> Tick {
        ((transport_tick - self.lead_in) as f64 / self.ratio).round() as Tick
    }
}
