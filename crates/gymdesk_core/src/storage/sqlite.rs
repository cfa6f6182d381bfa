//! SQLite-backed slot storage.
//!
//! # Invariants
//! - One row per slot key; `save` upserts and refreshes `updated_at`.

use super::{SlotResult, SlotStorage};
use crate::db::{open_db, open_db_in_memory};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Slot storage owning one migrated SQLite connection.
pub struct SqliteSlotStorage {
    conn: Connection,
}

impl SqliteSlotStorage {
    /// Wraps a connection that already went through `open_db*`.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens the database file at `path` and wraps it.
    pub fn open(path: impl AsRef<Path>) -> SlotResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> SlotResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Lists stored slot keys in ascending order.
    pub fn keys(&self) -> SlotResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT slot_key FROM kv_slots ORDER BY slot_key ASC;")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

impl SlotStorage for SqliteSlotStorage {
    fn load(&self, key: &str) -> SlotResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM kv_slots WHERE slot_key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn save(&mut self, key: &str, payload: &str) -> SlotResult<()> {
        self.conn.execute(
            "INSERT INTO kv_slots (slot_key, payload, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(slot_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at;",
            params![key, payload],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> SlotResult<()> {
        self.conn
            .execute("DELETE FROM kv_slots WHERE slot_key = ?1;", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteSlotStorage;
    use crate::storage::SlotStorage;

    #[test]
    fn upsert_keeps_single_row_per_key() {
        let mut storage = SqliteSlotStorage::open_in_memory().unwrap();
        storage.save("gymData", "{\"a\":1}").unwrap();
        storage.save("gymData", "{\"a\":2}").unwrap();
        storage.save("currentUser", "{}").unwrap();

        assert_eq!(
            storage.load("gymData").unwrap().as_deref(),
            Some("{\"a\":2}")
        );
        assert_eq!(storage.keys().unwrap(), vec!["currentUser", "gymData"]);
    }

    #[test]
    fn remove_of_missing_slot_is_not_an_error() {
        let mut storage = SqliteSlotStorage::open_in_memory().unwrap();
        storage.remove("never-written").unwrap();
        assert_eq!(storage.load("never-written").unwrap(), None);
    }
}
