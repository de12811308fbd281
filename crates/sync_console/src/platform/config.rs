use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use sync_core::SyncSettings;
use sync_engine::{EngineError, EngineSettings};

use super::logging::LogDestination;

pub(crate) const DEFAULT_CONFIG_FILENAME: &str = "sync_console.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ConsoleConfig {
    pub sync: SyncSettings,
    pub engine: EngineSettings,
    pub log: LogDestination,
    pub log_level: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            sync: SyncSettings::default(),
            engine: EngineSettings::default(),
            log: LogDestination::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ConsoleConfig {
    pub(crate) fn level(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("reconnect_base_ms must be non-zero and not above reconnect_max_ms")]
    Backoff,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Loads the console config. A missing file means defaults.
pub(crate) fn load(path: &Path) -> Result<ConsoleConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ConsoleConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let config: ConsoleConfig = ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    if config.sync.reconnect_base_ms == 0
        || config.sync.reconnect_base_ms > config.sync.reconnect_max_ms
    {
        return Err(ConfigError::Backoff);
    }
    config.engine.validate()?;
    Ok(config)
}
