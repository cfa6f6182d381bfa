//! SQLite bootstrap for the key-value slot backend.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections for slot persistence.
//! - Apply schema migrations before any slot is read or written.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - A database written by a newer binary is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while preparing the slot database.
#[derive(Debug)]
pub enum DbError {
    /// The connection itself could not be established.
    Open {
        mode: &'static str,
        source: rusqlite::Error,
    },
    /// Upgrading to `version` failed; the transaction was rolled back.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file carries a schema this build does not know.
    SchemaTooNew { found: u32, supported: u32 },
    /// Any other statement failure.
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { mode, source } => write!(f, "cannot open {mode} slot database: {source}"),
            Self::Migration { version, source } => {
                write!(f, "slot schema migration to v{version} failed: {source}")
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "slot database schema v{found} is newer than supported v{supported}"
            ),
            Self::Sqlite(err) => write!(f, "slot database statement failed: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Migration { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
