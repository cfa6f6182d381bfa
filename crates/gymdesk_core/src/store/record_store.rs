//! In-memory collections mirrored to one persistent slot.
//!
//! # Invariants
//! - All state sits behind one mutex; every call runs to completion.
//! - The lock is released before events are published, so subscribers
//!   may call back into the store.
//! - A persistence failure keeps the in-memory change and suppresses the
//!   change event.

use super::query::{Condition, Filter};
use super::snapshot::{encode_collections, StoreSnapshot};
use super::{DocumentStore, PersistenceError, StoreError, StoreResult};
use crate::event::{noop_notifier, Event, RecordEventKind, SharedNotifier};
use crate::model::document::{strip_reserved_fields, Document, Fields};
use crate::seed::default_documents;
use crate::storage::{MemorySlotStorage, SlotStorage};
use chrono::{SecondsFormat, Utc};
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Default slot name holding the record blob.
pub const DEFAULT_DATA_SLOT: &str = "gymData";

/// Options applied when opening a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub slot_key: String,
    /// Populate starter members/packages/catalog when the slot is empty.
    pub seed_defaults: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            slot_key: DEFAULT_DATA_SLOT.to_string(),
            seed_defaults: false,
        }
    }
}

/// Quick size summary of one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionStats {
    pub collection: String,
    pub total: usize,
    pub first: Option<Document>,
    pub last: Option<Document>,
}

struct StoreState<S> {
    collections: BTreeMap<String, Vec<Document>>,
    storage: S,
    last_stamp: i64,
}

impl<S: SlotStorage> StoreState<S> {
    fn next_stamp(&mut self) -> i64 {
        let stamp = Utc::now().timestamp_millis().max(self.last_stamp + 1);
        self.last_stamp = stamp;
        stamp
    }

    fn fresh_id(&self, collection: &str) -> String {
        let existing = self.collections.get(collection);
        loop {
            let id = Uuid::new_v4().to_string();
            let taken = existing.is_some_and(|docs| docs.iter().any(|doc| doc.id == id));
            if !taken {
                return id;
            }
        }
    }

    fn insert(&mut self, collection: &str, mut fields: Fields) -> Document {
        let stripped = strip_reserved_fields(&mut fields);
        if !stripped.is_empty() {
            debug!(
                "event=record_create module=store status=stripped collection={collection} fields={}",
                stripped.join("|")
            );
        }
        let stamp = self.next_stamp();
        let document = Document {
            id: self.fresh_id(collection),
            created_at: stamp,
            updated_at: stamp,
            fields,
        };
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        document
    }

    fn position(&self, collection: &str, id: &str) -> Option<usize> {
        self.collections
            .get(collection)?
            .iter()
            .position(|doc| doc.id == id)
    }

    fn persist(&mut self, slot_key: &str) -> Result<(), PersistenceError> {
        let payload = encode_collections(&self.collections)?;
        self.storage.save(slot_key, &payload)?;
        Ok(())
    }
}

/// Record Store over any slot backend.
pub struct RecordStore<S: SlotStorage> {
    state: Mutex<StoreState<S>>,
    slot_key: String,
    notifier: SharedNotifier,
}

impl RecordStore<MemorySlotStorage> {
    /// Empty, unseeded store with process-local persistence and no
    /// subscribers.
    pub fn in_memory() -> Self {
        Self::from_parts(
            MemorySlotStorage::new(),
            BTreeMap::new(),
            DEFAULT_DATA_SLOT.to_string(),
            noop_notifier(),
        )
    }
}

impl<S: SlotStorage> RecordStore<S> {
    /// Loads the whole state from `storage` once.
    ///
    /// # Errors
    /// - `Persistence(UnsupportedVersion)` when the slot was written by a
    ///   newer build; the slot is left untouched.
    ///
    /// A malformed payload or an unreadable slot is logged and the store
    /// starts from defaults instead. A failed seed write is logged too;
    /// the seeded documents stay in memory.
    pub fn open(storage: S, options: StoreOptions, notifier: SharedNotifier) -> StoreResult<Self> {
        let slot_key = options.slot_key.clone();
        let loaded = match storage.load(&slot_key) {
            Ok(Some(payload)) => match StoreSnapshot::decode(&payload) {
                Ok(snapshot) => Some(snapshot.collections),
                Err(err @ PersistenceError::UnsupportedVersion { .. }) => {
                    error!("event=store_open module=store status=error slot={slot_key} error={err}");
                    return Err(err.into());
                }
                Err(err) => {
                    warn!("event=store_open module=store status=fallback slot={slot_key} error={err}");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!("event=store_open module=store status=fallback slot={slot_key} error={err}");
                None
            }
        };

        let store = match loaded {
            Some(collections) => {
                let store = Self::from_parts(storage, collections, slot_key, notifier);
                info!(
                    "event=store_open module=store status=ok source=slot collections={}",
                    store.collection_names().len()
                );
                store
            }
            None => {
                let store = Self::from_parts(storage, BTreeMap::new(), slot_key, notifier);
                if options.seed_defaults {
                    if let Err(err) = store.seed() {
                        error!(
                            "event=store_seed module=store status=error error_code=persist_failed error={err}"
                        );
                    }
                }
                info!(
                    "event=store_open module=store status=ok source=defaults seeded={}",
                    options.seed_defaults
                );
                store
            }
        };
        Ok(store)
    }

    fn from_parts(
        storage: S,
        collections: BTreeMap<String, Vec<Document>>,
        slot_key: String,
        notifier: SharedNotifier,
    ) -> Self {
        let last_stamp = collections
            .values()
            .flatten()
            .map(|doc| doc.updated_at.max(doc.created_at))
            .max()
            .unwrap_or(0);
        Self {
            state: Mutex::new(StoreState {
                collections,
                storage,
                last_stamp,
            }),
            slot_key,
            notifier,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts the starter documents; they stay in memory even when the
    /// write fails.
    fn seed(&self) -> Result<(), PersistenceError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut state = self.lock();
        for (collection, fields) in default_documents(&now) {
            state.insert(collection, fields);
        }
        state.persist(&self.slot_key)
    }

    /// Slot name this store persists to.
    pub fn slot_key(&self) -> &str {
        &self.slot_key
    }

    /// Names of every collection that has ever held a document.
    pub fn collection_names(&self) -> Vec<String> {
        self.lock().collections.keys().cloned().collect()
    }

    pub fn stats(&self, collection: &str) -> CollectionStats {
        let state = self.lock();
        let docs = state
            .collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default();
        CollectionStats {
            collection: collection.to_string(),
            total: docs.len(),
            first: docs.first().cloned(),
            last: docs.last().cloned(),
        }
    }

    /// Copy of the full state in its persisted shape.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot::new(self.lock().collections.clone())
    }

    /// Writes the current state to the slot again.
    pub fn flush(&self) -> StoreResult<()> {
        let mut state = self.lock();
        state.persist(&self.slot_key).map_err(|err| {
            error!("event=store_flush module=store status=error error={err}");
            StoreError::from(err)
        })
    }

    /// Releases the slot backend, e.g. to reopen it in tests.
    pub fn into_storage(self) -> S {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .storage
    }

    fn finish_mutation(
        &self,
        persisted: Result<(), PersistenceError>,
        collection: &str,
        kind: RecordEventKind,
        document: &Document,
    ) -> StoreResult<()> {
        if let Err(err) = persisted {
            error!(
                "event=record_{} module=store status=error collection={collection} id={} error_code=persist_failed error={err}",
                kind.as_str(),
                document.id
            );
            return Err(err.into());
        }
        info!(
            "event=record_{} module=store status=ok collection={collection} id={}",
            kind.as_str(),
            document.id
        );
        self.notifier.publish(&Event::Record {
            collection: collection.to_string(),
            kind,
            document: document.clone(),
        });
        Ok(())
    }
}

impl<S: SlotStorage> DocumentStore for RecordStore<S> {
    fn create(&self, collection: &str, fields: Fields) -> StoreResult<Document> {
        let (document, persisted) = {
            let mut state = self.lock();
            let document = state.insert(collection, fields);
            (document, state.persist(&self.slot_key))
        };
        self.finish_mutation(persisted, collection, RecordEventKind::Created, &document)?;
        Ok(document)
    }

    fn read(&self, collection: &str, id: &str) -> StoreResult<Document> {
        debug!("event=record_read module=store collection={collection} id={id}");
        let state = self.lock();
        state
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .cloned()
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    fn read_all(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        let state = self.lock();
        let docs = state
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter.matches(doc))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        debug!(
            "event=record_read_all module=store collection={collection} filtered={} count={}",
            !filter.is_empty(),
            docs.len()
        );
        Ok(docs)
    }

    fn update(&self, collection: &str, id: &str, mut partial: Fields) -> StoreResult<Document> {
        strip_reserved_fields(&mut partial);
        let (document, persisted) = {
            let mut state = self.lock();
            let index = state
                .position(collection, id)
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            let stamp = state.next_stamp();
            let docs = state
                .collections
                .get_mut(collection)
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            let document = &mut docs[index];
            document.fields.extend(partial);
            document.updated_at = stamp;
            let document = document.clone();
            (document, state.persist(&self.slot_key))
        };
        self.finish_mutation(persisted, collection, RecordEventKind::Updated, &document)?;
        Ok(document)
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let (document, persisted) = {
            let mut state = self.lock();
            let index = state
                .position(collection, id)
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            let docs = state
                .collections
                .get_mut(collection)
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            let document = docs.remove(index);
            (document, state.persist(&self.slot_key))
        };
        self.finish_mutation(persisted, collection, RecordEventKind::Deleted, &document)
    }

    fn query(&self, collection: &str, conditions: &[Condition]) -> StoreResult<Vec<Document>> {
        let state = self.lock();
        let mut results: Vec<Document> = state
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default();
        for condition in conditions {
            results.retain(|doc| condition.matches(doc));
        }
        debug!(
            "event=record_query module=store collection={collection} conditions={} count={}",
            conditions.len(),
            results.len()
        );
        Ok(results)
    }
}
