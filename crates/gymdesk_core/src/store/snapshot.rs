//! Versioned on-slot format of the whole store.

use super::PersistenceError;
use crate::model::document::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form: `{"version":1,"collections":{"bills":[...]}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub collections: BTreeMap<String, Vec<Document>>,
}

impl StoreSnapshot {
    pub fn new(collections: BTreeMap<String, Vec<Document>>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            collections,
        }
    }

    pub fn encode(&self) -> Result<String, PersistenceError> {
        encode_collections(&self.collections)
    }

    /// Parses a payload, refusing versions written by a newer build.
    pub fn decode(payload: &str) -> Result<Self, PersistenceError> {
        let snapshot: Self = serde_json::from_str(payload).map_err(PersistenceError::Decode)?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: snapshot.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        Ok(snapshot)
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    collections: &'a BTreeMap<String, Vec<Document>>,
}

/// Encodes live collections without cloning them into a snapshot first.
pub(crate) fn encode_collections(
    collections: &BTreeMap<String, Vec<Document>>,
) -> Result<String, PersistenceError> {
    serde_json::to_string(&SnapshotRef {
        version: SNAPSHOT_VERSION,
        collections,
    })
    .map_err(PersistenceError::Encode)
}
