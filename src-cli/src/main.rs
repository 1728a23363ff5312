use std::io::BufRead;
use std::path::Path;
use std::process::ExitCode;
use std::sync::mpsc;
use std::time::Duration;
use stroke_core::{AppCore, AppError, Command, Event, ScoreSource};
use stroke_infra_midi_midir::MidirMidiInputPort;
use stroke_infra_storage_fs::FsStorage;
use stroke_ports::midi::{MidiError, MidiInputPort};
use stroke_ports::storage::StoragePort;
use stroke_ports::transport::{EndOfPiece, PracticeMode};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const TICK_INTERVAL: Duration = Duration::from_millis(16);

const USAGE: &str = "usage: stroke <score.mei|score.mid> [--drums] [--practice|--standard] [--loop|--once] [--bpm N] [--device NAME]";

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("{0}\n{USAGE}")]
    Usage(String),
    #[error(transparent)]
    Midi(#[from] MidiError),
    #[error(transparent)]
    App(#[from] AppError),
}

#[derive(Debug, Default)]
struct Options {
    score: String,
    drums: bool,
    mode: Option<PracticeMode>,
    end_of_piece: Option<EndOfPiece>,
    bpm: Option<f64>,
    device: Option<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, CliError> {
    let mut options = Options::default();
    let mut score = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--drums" => options.drums = true,
            "--practice" => options.mode = Some(PracticeMode::Practice),
            "--standard" => options.mode = Some(PracticeMode::Standard),
            "--loop" => options.end_of_piece = Some(EndOfPiece::Loop),
            "--once" => options.end_of_piece = Some(EndOfPiece::StopAndReset),
            "--bpm" => {
                let value = args
                    .next()
                    .ok_or_else(|| CliError::Usage("--bpm needs a value".to_string()))?;
                let bpm = value
                    .parse::<f64>()
                    .map_err(|_| CliError::Usage(format!("not a tempo: {value}")))?;
                options.bpm = Some(bpm);
            }
            "--device" => {
                options.device = Some(
                    args.next()
                        .ok_or_else(|| CliError::Usage("--device needs a name".to_string()))?,
                );
            }
            flag if flag.starts_with("--") => {
                return Err(CliError::Usage(format!("unknown flag {flag}")));
            }
            _ if score.is_none() => score = Some(arg),
            _ => return Err(CliError::Usage(format!("unexpected argument {arg}"))),
        }
    }
    options.score = score.ok_or_else(|| CliError::Usage("no score given".to_string()))?;
    Ok(options)
}

fn score_source(path: &str, drums: bool) -> ScoreSource {
    let is_midi = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("mid") || ext.eq_ignore_ascii_case("midi"))
        .unwrap_or(false);
    if is_midi {
        ScoreSource::MidiFile(path.to_string())
    } else {
        ScoreSource::MeiFile {
            path: path.to_string(),
            drums,
        }
    }
}

/// `play`, `pause`, `stop`, `seek N`, `bpm N` and `quit` on stdin.
fn parse_line(line: &str) -> Option<Result<Command, String>> {
    let mut words = line.split_whitespace();
    let command = match (words.next()?, words.next()) {
        ("play", None) => Command::Play,
        ("pause", None) => Command::Pause,
        ("stop", None) => Command::Stop,
        ("seek", Some(tick)) => match tick.parse() {
            Ok(score_tick) => Command::SeekScore { score_tick },
            Err(_) => return Some(Err(format!("not a tick: {tick}"))),
        },
        ("bpm", Some(bpm)) => match bpm.parse() {
            Ok(bpm) => Command::SetTempo { bpm },
            Err(_) => return Some(Err(format!("not a tempo: {bpm}"))),
        },
        (other, _) => return Some(Err(format!("unknown command {other}"))),
    };
    Some(Ok(command))
}

fn select_device(
    core: &mut AppCore,
    midi: &MidirMidiInputPort,
    query: Option<&str>,
) -> Result<(), CliError> {
    let remembered = core.settings().selected_midi_in.clone();
    let device_id = match (query, remembered) {
        (Some(query), _) => midi.find_input(query)?.id,
        (None, Some(id)) => id,
        (None, None) => {
            let devices = midi.list_inputs().unwrap_or_else(|err| {
                warn!(%err, "could not list MIDI inputs");
                Vec::new()
            });
            match devices.into_iter().next() {
                Some(device) => device.id,
                None => {
                    warn!("no MIDI input found, playing without a device");
                    return Ok(());
                }
            }
        }
    };
    if let Err(err) = core.handle_command(Command::SelectMidiInput {
        device_id: device_id.clone(),
    }) {
        if query.is_some() {
            return Err(err.into());
        }
        warn!(%err, device = %device_id, "could not open MIDI input");
    }
    Ok(())
}

fn log_event(event: &Event) {
    match event {
        Event::MidiInputsUpdated { devices } => {
            for device in devices {
                info!(id = %device.id, name = %device.name, "midi input");
            }
        }
        Event::SessionStateUpdated { state, .. } => info!(?state, "session"),
        Event::ScoreLoaded {
            title,
            events,
            total_ticks,
            score_ppq,
        } => info!(
            title = title.as_deref().unwrap_or("untitled"),
            events, total_ticks, score_ppq, "score loaded"
        ),
        Event::TransportUpdated { .. } => {}
        Event::RequiredNotesUpdated { notes } => {
            if !notes.is_empty() {
                info!(?notes, "waiting for");
            }
        }
        Event::Feedback {
            kind,
            notes,
            delta_ticks,
        } => info!(?kind, ?notes, ?delta_ticks, "feedback"),
        Event::FeedbackCleared => {}
        Event::PieceEnded { behaviour } => info!(?behaviour, "end of piece"),
    }
}

fn run(options: Options) -> Result<(), CliError> {
    let midi = MidirMidiInputPort::default();
    let storage: Option<Box<dyn StoragePort>> = Some(Box::new(FsStorage::default()));
    let mut core = AppCore::new(Box::new(MidirMidiInputPort::default()), storage)?;

    if let Some(mode) = options.mode {
        core.handle_command(Command::SetMode { mode })?;
    }
    // unset flags keep whatever was saved last time
    if let Some(behaviour) = options.end_of_piece {
        core.handle_command(Command::SetEndOfPiece { behaviour })?;
    }
    if let Some(bpm) = options.bpm {
        core.handle_command(Command::SetTempo { bpm })?;
    }
    select_device(&mut core, &midi, options.device.as_deref())?;

    core.handle_command(Command::LoadScore {
        source: score_source(&options.score, options.drums),
    })?;
    core.handle_command(Command::Play)?;

    let (line_tx, line_rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    loop {
        while let Ok(line) = line_rx.try_recv() {
            if line.trim() == "quit" {
                return Ok(());
            }
            match parse_line(&line) {
                Some(Ok(command)) => {
                    if let Err(err) = core.handle_command(command) {
                        error!(%err, "command failed");
                    }
                }
                Some(Err(msg)) => warn!("{msg}"),
                None => {}
            }
        }

        core.tick();
        for event in core.drain_events() {
            log_event(&event);
            if matches!(
                event,
                Event::PieceEnded {
                    behaviour: EndOfPiece::StopAndReset
                }
            ) {
                return Ok(());
            }
        }

        std::thread::sleep(TICK_INTERVAL);
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let result = parse_args(std::env::args().skip(1)).and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
