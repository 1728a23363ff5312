use crate::labeling::Notehead;
use stroke_ports::types::NoteId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrumPiece {
    Cymbal,
    OpenHiHat,
    ClosedHiHat,
    Tambourine,
    Cowbell,
    HighTom,
    MediumTom,
    RimShot,
    SnareDrum,
    Clap,
    LowTom,
    BassDrum,
}

impl DrumPiece {
    /// General MIDI percussion key, which is also what electronic kits send.
    pub fn gm_note(self) -> NoteId {
        match self {
            DrumPiece::Cymbal => 49,
            DrumPiece::OpenHiHat => 46,
            DrumPiece::ClosedHiHat => 42,
            DrumPiece::Tambourine => 54,
            DrumPiece::Cowbell => 56,
            DrumPiece::HighTom => 50,
            DrumPiece::MediumTom => 47,
            DrumPiece::RimShot => 37,
            DrumPiece::SnareDrum => 38,
            DrumPiece::Clap => 39,
            DrumPiece::LowTom => 45,
            DrumPiece::BassDrum => 36,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DrumPiece::Cymbal => "CY",
            DrumPiece::OpenHiHat => "OH",
            DrumPiece::ClosedHiHat => "CH",
            DrumPiece::Tambourine => "TB",
            DrumPiece::Cowbell => "CB",
            DrumPiece::HighTom => "HT",
            DrumPiece::MediumTom => "MT",
            DrumPiece::RimShot => "RS",
            DrumPiece::SnareDrum => "SD",
            DrumPiece::Clap => "CP",
            DrumPiece::LowTom => "LT",
            DrumPiece::BassDrum => "BD",
        }
    }

    pub fn from_gm_note(note: NoteId) -> Option<Self> {
        ALL_PIECES.iter().copied().find(|piece| piece.gm_note() == note)
    }
}

const ALL_PIECES: [DrumPiece; 12] = [
    DrumPiece::Cymbal,
    DrumPiece::OpenHiHat,
    DrumPiece::ClosedHiHat,
    DrumPiece::Tambourine,
    DrumPiece::Cowbell,
    DrumPiece::HighTom,
    DrumPiece::MediumTom,
    DrumPiece::RimShot,
    DrumPiece::SnareDrum,
    DrumPiece::Clap,
    DrumPiece::LowTom,
    DrumPiece::BassDrum,
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrumRule {
    pub pname: String,
    pub oct: String,
    /// When `None`, noteheads with any explicit shape do not match.
    pub head_shape: Option<String>,
    pub head_fill: Option<String>,
    pub piece: DrumPiece,
}

impl DrumRule {
    fn new(pname: &str, oct: &str, head_shape: Option<&str>, piece: DrumPiece) -> Self {
        Self {
            pname: pname.to_string(),
            oct: oct.to_string(),
            head_shape: head_shape.map(str::to_string),
            head_fill: None,
            piece,
        }
    }

    fn with_fill(mut self, fill: &str) -> Self {
        self.head_fill = Some(fill.to_string());
        self
    }

    fn matches(&self, head: &Notehead<'_>) -> bool {
        if head.pname != Some(self.pname.as_str()) || head.oct != Some(self.oct.as_str()) {
            return false;
        }
        let shape_ok = match self.head_shape.as_deref() {
            Some(shape) => head.head_shape == Some(shape),
            None => head.head_shape.is_none(),
        };
        let fill_ok = match self.head_fill.as_deref() {
            Some(fill) => head.head_fill == Some(fill),
            None => true,
        };
        shape_ok && fill_ok
    }
}

/// Ordered notehead rules; the first matching rule wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrumMap {
    rules: Vec<DrumRule>,
}

impl DrumMap {
    pub fn new(rules: Vec<DrumRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[DrumRule] {
        &self.rules
    }

    pub fn identify(&self, head: &Notehead<'_>) -> Option<DrumPiece> {
        self.rules
            .iter()
            .find(|rule| rule.matches(head))
            .map(|rule| rule.piece)
    }
}

impl Default for DrumMap {
    /// Standard five-line drum staff layout.
    fn default() -> Self {
        Self::new(vec![
            DrumRule::new("a", "5", Some("x"), DrumPiece::Cymbal),
            DrumRule::new("g", "5", Some("+"), DrumPiece::OpenHiHat),
            DrumRule::new("g", "5", Some("x"), DrumPiece::ClosedHiHat),
            DrumRule::new("f", "5", Some("diamond"), DrumPiece::Tambourine).with_fill("void"),
            DrumRule::new("f", "5", Some("diamond"), DrumPiece::Cowbell),
            DrumRule::new("e", "5", None, DrumPiece::HighTom),
            DrumRule::new("d", "5", None, DrumPiece::MediumTom),
            DrumRule::new("c", "5", Some("slash"), DrumPiece::RimShot),
            DrumRule::new("c", "5", None, DrumPiece::SnareDrum),
            DrumRule::new("e", "4", Some("x"), DrumPiece::Clap),
            DrumRule::new("a", "4", None, DrumPiece::LowTom),
            DrumRule::new("f", "4", None, DrumPiece::BassDrum),
        ])
    }
}
