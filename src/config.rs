use crate::utils::get_config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default chrono format used in generated file names
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%d-%m-%Y_%H-%M-%S";

/// Optional user configuration read from `config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Directory for default-named output files (current directory when unset)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
    /// Write a `.sha256` sidecar next to the answers record
    #[serde(default = "default_true")]
    pub write_checksum: bool,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            timestamp_format: default_timestamp_format(),
            write_checksum: true,
        }
    }
}

fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

fn default_true() -> bool {
    true
}

/// Loads the config from `path`, or returns default if missing or unreadable.
pub fn load_config_from(path: &Path) -> WizardConfig {
    match std::fs::read_to_string(path) {
        Ok(json) => match serde_json::from_str::<WizardConfig>(&json) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring invalid config '{}': {e}", path.display());
                WizardConfig::default()
            }
        },
        Err(_) => WizardConfig::default(),
    }
}

/// Loads the config from the XDG config directory.
pub fn load_config() -> WizardConfig {
    if let Some(mut path) = get_config_dir() {
        path.push("config.json");
        return load_config_from(&path);
    }
    WizardConfig::default()
}
