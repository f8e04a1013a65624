//! Document store abstraction.
//!
//! Every repository talks to persistence through [`DocumentStore`]: four
//! record operations over named collections, plus batched writes. Records are
//! JSON objects keyed by one of their own fields (see [`Collection::key_field`]).
//!
//! Two backends ship with the crate:
//! - [`SqliteStore`]: a local embedded store, one row per record.
//! - [`MemoryStore`]: an in-process document store.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::{EntityKind, Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// The named collections a store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// Tasks grouped by ISO date, one record per date.
    TaskBuckets,
    /// Flat projects.
    Projects,
    /// Application settings (single `app` record).
    Settings,
    /// Hierarchical project documents.
    ProjectTrees,
    /// Assignees and their notification logs.
    Intervenants,
    /// Kanban cards.
    DailyTasks,
}

impl Collection {
    /// Every collection, in a stable order.
    pub const ALL: [Self; 6] = [
        Self::TaskBuckets,
        Self::Projects,
        Self::Settings,
        Self::ProjectTrees,
        Self::Intervenants,
        Self::DailyTasks,
    ];

    /// Storage name of the collection.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TaskBuckets => "tasks",
            Self::Projects => "projects",
            Self::Settings => "settings",
            Self::ProjectTrees => "project-trees",
            Self::Intervenants => "intervenants",
            Self::DailyTasks => "daily-tasks",
        }
    }

    /// The record field holding the key.
    #[must_use]
    pub const fn key_field(self) -> &'static str {
        match self {
            Self::TaskBuckets => "date",
            Self::Settings => "key",
            Self::Projects | Self::ProjectTrees | Self::Intervenants | Self::DailyTasks => "id",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extract the key of a record for the given collection.
///
/// # Errors
///
/// Returns a validation error if the key field is missing, empty, or not a string.
pub fn record_key(collection: Collection, record: &Value) -> Result<String> {
    let field = collection.key_field();
    match record.get(field).and_then(Value::as_str) {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ => Err(Error::Validation(format!("record in `{collection}` has no `{field}` key"))),
    }
}

/// A single write in a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Upsert a record.
    Put {
        /// Target collection.
        collection: Collection,
        /// The full record.
        record: Value,
    },
    /// Remove a record by key.
    Delete {
        /// Target collection.
        collection: Collection,
        /// Key of the record.
        key: String,
    },
}

/// An ordered group of writes.
///
/// Backends with transactions commit a batch atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an upsert of a raw record.
    pub fn put(&mut self, collection: Collection, record: Value) {
        self.ops.push(WriteOp::Put { collection, record });
    }

    /// Queue an upsert of a serializable value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    pub fn put_as<T: Serialize>(&mut self, collection: Collection, value: &T) -> Result<()> {
        self.put(collection, serde_json::to_value(value)?);
        Ok(())
    }

    /// Queue a deletion.
    pub fn delete(&mut self, collection: Collection, key: impl Into<String>) {
        self.ops.push(WriteOp::Delete { collection, key: key.into() });
    }

    /// Number of queued writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The queued writes, in order.
    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Check every queued put carries its key.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the first record without a key.
    pub fn validate(&self) -> Result<()> {
        for op in &self.ops {
            if let WriteOp::Put { collection, record } = op {
                record_key(*collection, record)?;
            }
        }
        Ok(())
    }
}

impl IntoIterator for WriteBatch {
    type Item = WriteOp;
    type IntoIter = std::vec::IntoIter<WriteOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

/// Trait for document persistence.
///
/// All methods may fail with a backend error. Repositories call
/// [`DocumentStore::ensure_available`] before every operation.
#[allow(clippy::missing_errors_doc)]
pub trait DocumentStore {
    /// Short name of the backend, for diagnostics.
    fn backend_name(&self) -> &'static str;

    /// Fail fast with [`Error::BackendUnavailable`] if the store cannot be used.
    fn ensure_available(&self) -> Result<()>;

    /// All records of a collection, ordered by key.
    fn get_all(&self, collection: Collection) -> Result<Vec<Value>>;

    /// One record by key.
    fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>>;

    /// Upsert a record under its own key field.
    fn put(&self, collection: Collection, record: &Value) -> Result<()>;

    /// Remove a record. Returns whether it existed.
    fn delete(&self, collection: Collection, key: &str) -> Result<bool>;

    /// Remove every record of a collection.
    fn clear(&self, collection: Collection) -> Result<()> {
        for record in self.get_all(collection)? {
            let key = record_key(collection, &record)?;
            self.delete(collection, &key)?;
        }
        Ok(())
    }

    /// Apply a batch of writes in order.
    ///
    /// The default applies writes one at a time; a failure part-way leaves
    /// earlier writes in place.
    fn apply(&self, batch: WriteBatch) -> Result<()> {
        batch.validate()?;
        for op in batch {
            match op {
                WriteOp::Put { collection, record } => self.put(collection, &record)?,
                WriteOp::Delete { collection, key } => {
                    self.delete(collection, &key)?;
                }
            }
        }
        Ok(())
    }
}

/// Typed access on top of [`DocumentStore`].
#[allow(clippy::missing_errors_doc)]
pub trait DocumentStoreExt: DocumentStore {
    /// All records of a collection, decoded.
    fn get_all_as<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        self.get_all(collection)?
            .into_iter()
            .map(|record| {
                serde_json::from_value(record).map_err(|e| {
                    tracing::warn!(collection = %collection, error = %e, "undecodable record");
                    Error::from(e)
                })
            })
            .collect()
    }

    /// One record, decoded.
    fn get_as<T: DeserializeOwned>(&self, collection: Collection, key: &str) -> Result<Option<T>> {
        self.get(collection, key)?.map(serde_json::from_value).transpose().map_err(Error::from)
    }

    /// One record, decoded, or [`Error::NotFound`].
    fn require_as<T: DeserializeOwned>(
        &self,
        collection: Collection,
        kind: EntityKind,
        key: &str,
    ) -> Result<T> {
        self.get_as(collection, key)?.ok_or_else(|| Error::not_found(kind, key))
    }

    /// Encode and upsert a value.
    fn put_as<T: Serialize>(&self, collection: Collection, value: &T) -> Result<()> {
        self.put(collection, &serde_json::to_value(value)?)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}
