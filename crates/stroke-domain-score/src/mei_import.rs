use crate::labeling::{NoteLabeling, Notehead};
use crate::model::{Meter, ScoreDocument, ScoreEvent, ScoreMeta, ScoreSource, DEFAULT_SCORE_PPQ};
use roxmltree::{Document, Node};
use stroke_ports::types::Tick;
use std::path::Path;
use tracing::debug;

#[derive(thiserror::Error, Debug)]
pub enum MeiImportError {
    #[error("io error: {0}")]
    Io(String),
    #[error("parse error: {0}")]
    Parse(String),
}

pub fn import_mei_path(path: &Path, labeling: &NoteLabeling) -> Result<ScoreDocument, MeiImportError> {
    let data = std::fs::read_to_string(path).map_err(|e| MeiImportError::Io(e.to_string()))?;
    import_mei_str(&data, labeling)
}

pub fn import_mei_str(xml: &str, labeling: &NoteLabeling) -> Result<ScoreDocument, MeiImportError> {
    let doc = Document::parse(xml).map_err(|e| MeiImportError::Parse(e.to_string()))?;
    let title = doc
        .descendants()
        .find(|node| node.has_tag_name("title"))
        .and_then(|node| node.text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    let ppq = declared_ppq(&doc).unwrap_or_else(|| {
        debug!("MEI document declares no ppq, using {DEFAULT_SCORE_PPQ}");
        DEFAULT_SCORE_PPQ
    });

    let mut meter: Option<Meter> = None;
    let mut first_meter: Option<Meter> = None;
    let mut global_tick: Tick = 0;
    let mut events: Vec<ScoreEvent> = Vec::new();

    for node in doc.descendants().filter(|node| node.is_element()) {
        if node.has_tag_name("scoreDef") || node.has_tag_name("staffDef") {
            if let Some(m) = attribute_meter(&node, "meter.count", "meter.unit") {
                meter = Some(m);
            }
        } else if node.has_tag_name("meterSig") {
            if node.ancestors().any(|a| a.has_tag_name("measure")) {
                continue;
            }
            if let Some(m) = attribute_meter(&node, "count", "unit") {
                meter = Some(m);
            }
        } else if node.has_tag_name("measure") {
            if node.attribute("n").map(str::trim) == Some("0") {
                // count-in bar; playback supplies its own lead-in
                continue;
            }
            let current = meter.unwrap_or_default();
            first_meter.get_or_insert(current);
            let measure_len = current.ticks_per_measure(ppq);
            let measure_end = read_measure(&node, global_tick, ppq, labeling, &mut events);
            global_tick = (global_tick + measure_len).max(measure_end);
        }
    }

    if meter.is_none() {
        debug!("MEI document declares no meter, assuming 4/4");
    }

    events.sort_by_key(|event| (event.track_index, event.start_tick));

    Ok(ScoreDocument {
        meta: ScoreMeta {
            title,
            source: ScoreSource::Mei,
        },
        ppq,
        meter: first_meter.or(meter).unwrap_or_default(),
        events,
        end_tick: global_tick,
    })
}

fn declared_ppq(doc: &Document<'_>) -> Option<u16> {
    doc.descendants()
        .filter(|node| node.has_tag_name("scoreDef") || node.has_tag_name("staffDef"))
        .filter_map(|node| node.attribute("ppq"))
        .filter_map(|value| value.trim().parse::<u16>().ok())
        .find(|ppq| *ppq > 0)
}

fn attribute_meter(node: &Node<'_, '_>, count_attr: &str, unit_attr: &str) -> Option<Meter> {
    let count = node.attribute(count_attr)?.trim().parse::<u32>().ok()?;
    let unit = node.attribute(unit_attr)?.trim().parse::<u32>().ok()?;
    Meter::new(count, unit)
}

/// Returns the furthest tick any layer of the measure reached.
fn read_measure(
    measure: &Node<'_, '_>,
    start: Tick,
    ppq: u16,
    labeling: &NoteLabeling,
    events: &mut Vec<ScoreEvent>,
) -> Tick {
    let mut end = start;
    let staves = measure
        .children()
        .filter(|node| node.is_element() && node.has_tag_name("staff"));
    for (position, staff) in staves.enumerate() {
        let track_index = staff
            .attribute("n")
            .and_then(|n| n.trim().parse::<u32>().ok())
            .map(|n| n.saturating_sub(1))
            .unwrap_or(position as u32);

        for layer in staff
            .children()
            .filter(|node| node.is_element() && node.has_tag_name("layer"))
        {
            let mut reader = LayerReader {
                cursor: start as f64,
                ppq,
                track_index,
                labeling,
                events: &mut *events,
            };
            for child in layer.children().filter(|node| node.is_element()) {
                reader.read(&child, 1.0);
            }
            end = end.max(reader.cursor.ceil() as Tick);
        }
    }
    end
}

struct LayerReader<'a> {
    cursor: f64,
    ppq: u16,
    track_index: u32,
    labeling: &'a NoteLabeling,
    events: &'a mut Vec<ScoreEvent>,
}

impl LayerReader<'_> {
    fn read(&mut self, node: &Node<'_, '_>, inherited: f64) {
        let modifier = inherited * tuplet_ratio(node);
        match node.tag_name().name() {
            "note" => {
                if is_grace(node) {
                    return;
                }
                self.push_note(node);
                self.cursor += self.duration(node, modifier);
            }
            "chord" => {
                if is_grace(node) {
                    return;
                }
                for note in node
                    .descendants()
                    .filter(|n| n.is_element() && n.has_tag_name("note"))
                {
                    self.push_note(&note);
                }
                self.cursor += self.duration(node, modifier);
            }
            "rest" | "space" => {
                self.cursor += self.duration(node, modifier);
            }
            "beam" | "tuplet" | "bTrem" | "fTrem" => {
                for child in node.children().filter(|n| n.is_element()) {
                    self.read(&child, modifier);
                }
            }
            _ => {}
        }
    }

    fn push_note(&mut self, note: &Node<'_, '_>) {
        if is_tie_continuation(note) {
            return;
        }
        let head = Notehead {
            pname: note.attribute("pname"),
            oct: note.attribute("oct"),
            accid: accidental(note),
            head_shape: note.attribute("head.shape"),
            head_fill: note.attribute("head.fill"),
        };
        match self.labeling.identify(&head) {
            Some(id) => self.events.push(ScoreEvent {
                note: id,
                track_index: self.track_index,
                start_tick: self.cursor.round() as Tick,
            }),
            None => debug!(?head, "notehead has no identity under the active labeling"),
        }
    }

    fn duration(&self, node: &Node<'_, '_>, modifier: f64) -> f64 {
        if let Some(ticks) = node
            .attribute("dur.ppq")
            .and_then(|v| v.trim().parse::<f64>().ok())
        {
            return ticks.max(0.0);
        }
        let Some(quarters) = node.attribute("dur").and_then(quarters_for_dur) else {
            return 0.0;
        };
        let dots = node
            .attribute("dots")
            .and_then(|v| v.trim().parse::<i32>().ok())
            .unwrap_or(0)
            .clamp(0, 4);
        let dotted = 2.0 - 0.5f64.powi(dots);
        quarters * dotted * self.ppq as f64 * modifier
    }
}

fn quarters_for_dur(dur: &str) -> Option<f64> {
    match dur.trim() {
        "long" => Some(16.0),
        "breve" => Some(8.0),
        other => {
            let value = other.parse::<f64>().ok()?;
            (value > 0.0).then(|| 4.0 / value)
        }
    }
}

/// `numbase / num` when both are declared, otherwise 1.
fn tuplet_ratio(node: &Node<'_, '_>) -> f64 {
    let num = node.attribute("num").and_then(|v| v.trim().parse::<f64>().ok());
    let numbase = node.attribute("numbase").and_then(|v| v.trim().parse::<f64>().ok());
    match (num, numbase) {
        (Some(num), Some(numbase)) if num > 0.0 && numbase > 0.0 => numbase / num,
        _ => 1.0,
    }
}

fn is_grace(node: &Node<'_, '_>) -> bool {
    node.attribute("grace").is_some()
}

fn is_tie_continuation(note: &Node<'_, '_>) -> bool {
    matches!(note.attribute("tie").map(str::trim), Some("m") | Some("t"))
}

fn accidental<'a>(note: &Node<'a, '_>) -> Option<&'a str> {
    note.attribute("accid")
        .or_else(|| note.attribute("accid.ges"))
        .or_else(|| {
            note.children()
                .find(|n| n.is_element() && n.has_tag_name("accid"))
                .and_then(|n| n.attribute("accid").or_else(|| n.attribute("accid.ges")))
        })
}
