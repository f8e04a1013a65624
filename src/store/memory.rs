//! In-process document store.
//!
//! Holds every collection in ordered maps. Useful for embedding and tests,
//! and it can be switched offline to exercise unavailable-backend handling.

use super::{record_key, Collection, DocumentStore, WriteBatch, WriteOp};
use crate::error::{Error, Result};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

/// Document store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RefCell<HashMap<Collection, BTreeMap<String, Value>>>,
    offline: Cell<bool>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backend going away (or coming back).
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// Number of records in a collection.
    #[must_use]
    pub fn len(&self, collection: Collection) -> usize {
        self.collections.borrow().get(&collection).map_or(0, BTreeMap::len)
    }
}

impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn ensure_available(&self) -> Result<()> {
        if self.offline.get() {
            return Err(Error::BackendUnavailable("memory store is offline".to_string()));
        }
        Ok(())
    }

    fn get_all(&self, collection: Collection) -> Result<Vec<Value>> {
        self.ensure_available()?;
        Ok(self
            .collections
            .borrow()
            .get(&collection)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>> {
        self.ensure_available()?;
        Ok(self.collections.borrow().get(&collection).and_then(|records| records.get(key)).cloned())
    }

    fn put(&self, collection: Collection, record: &Value) -> Result<()> {
        self.ensure_available()?;
        let key = record_key(collection, record)?;
        self.collections.borrow_mut().entry(collection).or_default().insert(key, record.clone());
        Ok(())
    }

    fn delete(&self, collection: Collection, key: &str) -> Result<bool> {
        self.ensure_available()?;
        Ok(self
            .collections
            .borrow_mut()
            .get_mut(&collection)
            .is_some_and(|records| records.remove(key).is_some()))
    }

    fn clear(&self, collection: Collection) -> Result<()> {
        self.ensure_available()?;
        self.collections.borrow_mut().remove(&collection);
        Ok(())
    }

    fn apply(&self, batch: WriteBatch) -> Result<()> {
        self.ensure_available()?;
        // Keys are checked up front, so a batch either lands whole or not at all.
        batch.validate()?;
        let mut collections = self.collections.borrow_mut();
        for op in batch {
            match op {
                WriteOp::Put { collection, record } => {
                    let key = record_key(collection, &record)?;
                    collections.entry(collection).or_default().insert(key, record);
                }
                WriteOp::Delete { collection, key } => {
                    if let Some(records) = collections.get_mut(&collection) {
                        records.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }
}
