//! Persistent key-value slots.
//!
//! # Responsibility
//! - Hold opaque serialized blobs under fixed slot names (the record blob,
//!   the session blob).
//! - Hide whether slots live in SQLite or in process memory.
//!
//! # Invariants
//! - `save` replaces the whole payload; there is no partial write API.
//! - `load` of a never-written slot is `Ok(None)`, not an error.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemorySlotStorage;
pub use sqlite::SqliteSlotStorage;

pub type SlotResult<T> = Result<T, SlotError>;

/// Failure raised by a slot backend.
#[derive(Debug)]
pub enum SlotError {
    Db(DbError),
    Unavailable(String),
}

impl Display for SlotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "slot storage unavailable: {message}"),
        }
    }
}

impl Error for SlotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for SlotError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SlotError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Backend contract for whole-blob slot persistence.
pub trait SlotStorage {
    fn load(&self, key: &str) -> SlotResult<Option<String>>;
    fn save(&mut self, key: &str, payload: &str) -> SlotResult<()>;
    fn remove(&mut self, key: &str) -> SlotResult<()>;
}

impl<T: SlotStorage + ?Sized> SlotStorage for Box<T> {
    fn load(&self, key: &str) -> SlotResult<Option<String>> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, payload: &str) -> SlotResult<()> {
        (**self).save(key, payload)
    }

    fn remove(&mut self, key: &str) -> SlotResult<()> {
        (**self).remove(key)
    }
}
