use crate::drums::DrumMap;
use stroke_ports::types::NoteId;

/// Notation attributes of one notehead, as read from the score document.
#[derive(Clone, Copy, Debug, Default)]
pub struct Notehead<'a> {
    pub pname: Option<&'a str>,
    pub oct: Option<&'a str>,
    /// Written or gestural accidental (`s`, `f`, `ss`, `x`, `ff`, `n`).
    pub accid: Option<&'a str>,
    pub head_shape: Option<&'a str>,
    pub head_fill: Option<&'a str>,
}

/// How noteheads turn into the note identities the performer must play.
#[derive(Clone, Debug, Default)]
pub enum NoteLabeling {
    #[default]
    Pitched,
    Drums(DrumMap),
}

impl NoteLabeling {
    pub fn drums() -> Self {
        NoteLabeling::Drums(DrumMap::default())
    }

    pub fn identify(&self, head: &Notehead<'_>) -> Option<NoteId> {
        match self {
            NoteLabeling::Pitched => midi_pitch(head),
            NoteLabeling::Drums(map) => map.identify(head).map(|piece| piece.gm_note()),
        }
    }
}

fn midi_pitch(head: &Notehead<'_>) -> Option<NoteId> {
    let pitch_class: i32 = match head.pname?.trim() {
        "c" => 0,
        "d" => 2,
        "e" => 4,
        "f" => 5,
        "g" => 7,
        "a" => 9,
        "b" => 11,
        _ => return None,
    };
    let octave: i32 = head.oct?.trim().parse().ok()?;
    let alter = match head.accid.map(str::trim) {
        Some("s") => 1,
        Some("ss") | Some("x") => 2,
        Some("f") => -1,
        Some("ff") => -2,
        _ => 0,
    };
    let midi = (octave + 1) * 12 + pitch_class + alter;
    u8::try_from(midi).ok().filter(|note| *note <= 127)
}
