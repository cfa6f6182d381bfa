//! Runtime configuration for a gymdesk core instance.
//!
//! # Invariants
//! - `data_dir` is absolute; everything else has a default.
//! - A loaded config has passed `validate`.

use crate::auth::gate::DEFAULT_SESSION_SLOT;
use crate::logging::{default_log_level, init_logging, parse_level, LoggingError};
use crate::store::DEFAULT_DATA_SLOT;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Component, Path, PathBuf};

const DEFAULT_DATABASE_FILE: &str = "gymdesk.sqlite3";
const LOG_SUBDIR: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "malformed config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    /// Root for the database file and logs.
    pub data_dir: PathBuf,
    #[serde(default = "default_database_file")]
    pub database_file: String,
    /// Slot holding the document snapshot.
    #[serde(default = "default_data_slot")]
    pub data_slot: String,
    /// Slot holding the signed-in session.
    #[serde(default = "default_session_slot")]
    pub session_slot: String,
    #[serde(default = "default_level")]
    pub log_level: String,
    /// Seed sample members and catalog data into an empty store.
    #[serde(default = "default_seed")]
    pub seed_defaults: bool,
}

impl CoreConfig {
    /// Defaults rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            database_file: default_database_file(),
            data_slot: default_data_slot(),
            session_slot: default_session_slot(),
            log_level: default_level(),
            seed_defaults: default_seed(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.data_dir.is_absolute() {
            return Err(ConfigError::Invalid(format!(
                "data_dir must be an absolute path, got `{}`",
                self.data_dir.display()
            )));
        }
        let database_file = self.database_file.trim();
        let mut components = Path::new(database_file).components();
        let plain_name = matches!(components.next(), Some(Component::Normal(_)))
            && components.next().is_none();
        if !plain_name {
            return Err(ConfigError::Invalid(
                "database_file must be a plain file name".to_string(),
            ));
        }
        if self.data_slot.trim().is_empty() || self.session_slot.trim().is_empty() {
            return Err(ConfigError::Invalid("slot keys cannot be empty".to_string()));
        }
        if self.data_slot == self.session_slot {
            return Err(ConfigError::Invalid(
                "data_slot and session_slot must differ".to_string(),
            ));
        }
        parse_level(&self.log_level).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(self.database_file.trim())
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_SUBDIR)
    }

    /// Starts file logging under `log_dir()` at `log_level`.
    pub fn start_logging(&self) -> Result<(), LoggingError> {
        let log_dir = self.log_dir();
        let Some(log_dir) = log_dir.to_str() else {
            return Err(LoggingError::InvalidDir(format!(
                "log directory is not valid UTF-8: `{}`",
                log_dir.display()
            )));
        };
        init_logging(&self.log_level, log_dir)
    }
}

fn default_database_file() -> String {
    DEFAULT_DATABASE_FILE.to_string()
}

fn default_data_slot() -> String {
    DEFAULT_DATA_SLOT.to_string()
}

fn default_session_slot() -> String {
    DEFAULT_SESSION_SLOT.to_string()
}

fn default_level() -> String {
    default_log_level().to_string()
}

fn default_seed() -> bool {
    true
}
