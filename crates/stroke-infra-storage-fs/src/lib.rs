use stroke_ports::storage::{SettingsDto, StorageError, StoragePort};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const APP_DIR: &str = "Stroke";
const SETTINGS_FILE: &str = "settings.json";
const STAGING_EXTENSION: &str = "json.tmp";

fn io_error(err: std::io::Error) -> StorageError {
    StorageError::Io(err.to_string())
}

fn serde_error(err: serde_json::Error) -> StorageError {
    StorageError::Serde(err.to_string())
}

/// Trainer settings kept as one pretty-printed JSON file.
///
/// A missing file reads as defaults. Saves go through a staging file and a
/// rename, so a crash mid-write leaves the previous settings intact.
pub struct FsStorage {
    settings_path: PathBuf,
}

impl FsStorage {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            settings_path: base_dir.join(SETTINGS_FILE),
        }
    }

    /// `<config dir>/Stroke`, e.g. `~/.config/Stroke` on Linux.
    pub fn in_config_dir() -> Result<Self, StorageError> {
        let config = dirs_next::config_dir()
            .ok_or_else(|| StorageError::Io("config dir not found".to_string()))?;
        Ok(Self::new(config.join(APP_DIR)))
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    fn staging_path(&self) -> PathBuf {
        self.settings_path.with_extension(STAGING_EXTENSION)
    }
}

impl Default for FsStorage {
    fn default() -> Self {
        Self::in_config_dir().unwrap_or_else(|err| {
            warn!(%err, "no config dir, keeping settings in the working directory");
            Self::new(PathBuf::from("."))
        })
    }
}

impl StoragePort for FsStorage {
    fn load_settings(&self) -> Result<SettingsDto, StorageError> {
        let text = match fs::read_to_string(&self.settings_path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.settings_path.display(), "no saved settings");
                return Ok(SettingsDto::default());
            }
            Err(err) => return Err(io_error(err)),
        };
        serde_json::from_str(&text).map_err(serde_error)
    }

    fn save_settings(&self, s: &SettingsDto) -> Result<(), StorageError> {
        if let Some(dir) = self.settings_path.parent() {
            fs::create_dir_all(dir).map_err(io_error)?;
        }
        let staging = self.staging_path();
        let json = serde_json::to_string_pretty(s).map_err(serde_error)?;
        fs::write(&staging, json).map_err(io_error)?;
        fs::rename(&staging, &self.settings_path).map_err(io_error)?;
        debug!(path = %self.settings_path.display(), "settings saved");
        Ok(())
    }
}
