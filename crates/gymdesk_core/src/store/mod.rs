//! Record Store: named collections of schema-less documents.
//!
//! # Responsibility
//! - Own the canonical copy of every document; hand out clones.
//! - Mirror the whole state to one persistent slot after each mutation.
//! - Offer exact-match filters and operator queries over a collection.
//!
//! # Invariants
//! - `id` is unique within a collection for the lifetime of the store.
//! - `createdAt` never changes; `updatedAt` strictly increases on update.
//! - Unknown collections read as empty, never as errors.
//! - A failed call on one collection leaves every other one untouched.

use crate::model::document::{Document, DocumentId, Fields};
use crate::storage::SlotError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod query;
mod record_store;
mod snapshot;

pub use query::{Condition, Filter, Operator};
pub use record_store::{CollectionStats, RecordStore, StoreOptions, DEFAULT_DATA_SLOT};
pub use snapshot::{StoreSnapshot, SNAPSHOT_VERSION};

pub type StoreResult<T> = Result<T, StoreError>;

/// Why the persisted slot could not be read or written.
#[derive(Debug)]
pub enum PersistenceError {
    Slot(SlotError),
    Encode(serde_json::Error),
    Decode(serde_json::Error),
    UnsupportedVersion { found: u32, supported: u32 },
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slot(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode store snapshot: {err}"),
            Self::Decode(err) => write!(f, "failed to decode store snapshot: {err}"),
            Self::UnsupportedVersion { found, supported } => write!(
                f,
                "store snapshot version {found} is newer than supported {supported}"
            ),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Slot(err) => Some(err),
            Self::Encode(err) | Self::Decode(err) => Some(err),
            Self::UnsupportedVersion { .. } => None,
        }
    }
}

impl From<SlotError> for PersistenceError {
    fn from(value: SlotError) -> Self {
        Self::Slot(value)
    }
}

/// Error returned by Record Store operations.
#[derive(Debug)]
pub enum StoreError {
    NotFound {
        collection: String,
        id: DocumentId,
    },
    /// Storage could not be written or read. For mutations the in-memory
    /// change has already been applied.
    Persistence(PersistenceError),
}

impl StoreError {
    pub(crate) fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { collection, id } => {
                write!(f, "document {id} not found in {collection}")
            }
            Self::Persistence(err) => write!(f, "persistence failure: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound { .. } => None,
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<PersistenceError> for StoreError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

/// Capability interface every domain service receives at construction.
pub trait DocumentStore {
    /// Appends a new document; the store assigns `id` and timestamps.
    fn create(&self, collection: &str, fields: Fields) -> StoreResult<Document>;
    fn read(&self, collection: &str, id: &str) -> StoreResult<Document>;
    /// Returns documents matching `filter`, in insertion order.
    fn read_all(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>>;
    /// Shallow-merges `partial` onto the stored document.
    fn update(&self, collection: &str, id: &str, partial: Fields) -> StoreResult<Document>;
    fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;
    /// Applies `conditions` in order as successive filters.
    fn query(&self, collection: &str, conditions: &[Condition]) -> StoreResult<Vec<Document>>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for &T {
    fn create(&self, collection: &str, fields: Fields) -> StoreResult<Document> {
        (**self).create(collection, fields)
    }

    fn read(&self, collection: &str, id: &str) -> StoreResult<Document> {
        (**self).read(collection, id)
    }

    fn read_all(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        (**self).read_all(collection, filter)
    }

    fn update(&self, collection: &str, id: &str, partial: Fields) -> StoreResult<Document> {
        (**self).update(collection, id, partial)
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        (**self).delete(collection, id)
    }

    fn query(&self, collection: &str, conditions: &[Condition]) -> StoreResult<Vec<Document>> {
        (**self).query(collection, conditions)
    }
}

impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    fn create(&self, collection: &str, fields: Fields) -> StoreResult<Document> {
        (**self).create(collection, fields)
    }

    fn read(&self, collection: &str, id: &str) -> StoreResult<Document> {
        (**self).read(collection, id)
    }

    fn read_all(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        (**self).read_all(collection, filter)
    }

    fn update(&self, collection: &str, id: &str, partial: Fields) -> StoreResult<Document> {
        (**self).update(collection, id, partial)
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        (**self).delete(collection, id)
    }

    fn query(&self, collection: &str, conditions: &[Condition]) -> StoreResult<Vec<Document>> {
        (**self).query(collection, conditions)
    }
}
