use super::{SlotResult, SlotStorage};
use std::collections::HashMap;

/// Process-local slot backend. Nothing survives a restart.
#[derive(Debug, Clone, Default)]
pub struct MemorySlotStorage {
    slots: HashMap<String, String>,
}

impl MemorySlotStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates one slot, used to simulate state left by a previous run.
    pub fn with_slot(mut self, key: impl Into<String>, payload: impl Into<String>) -> Self {
        self.slots.insert(key.into(), payload.into());
        self
    }
}

impl SlotStorage for MemorySlotStorage {
    fn load(&self, key: &str) -> SlotResult<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn save(&mut self, key: &str, payload: &str) -> SlotResult<()> {
        self.slots.insert(key.to_string(), payload.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> SlotResult<()> {
        self.slots.remove(key);
        Ok(())
    }
}
