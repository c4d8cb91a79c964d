//! In-memory record store with unit-of-work scopes.
//!
//! Records are JSON values keyed by string, each carrying a version that
//! increases on every committed write. A [`StagedWrites`] scope buffers
//! writes and applies them atomically on commit, refusing the whole batch if
//! any key moved since it was staged.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use super::{TransactionError, TransactionManager};

#[derive(Debug, Clone)]
struct Record {
    version: u64,
    value: Option<Value>,
}

#[derive(Debug, Default)]
struct Counters {
    begun: AtomicUsize,
    committed: AtomicUsize,
    rolled_back: AtomicUsize,
    conflicts: AtomicUsize,
}

/// Snapshot of scope activity on an [`InMemoryStore`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransactionStats {
    /// Scopes opened.
    pub begun: usize,
    /// Scopes committed.
    pub committed: usize,
    /// Scopes rolled back.
    pub rolled_back: usize,
    /// Commits refused because a key changed underneath the scope.
    pub conflicts: usize,
}

/// Thread-safe record store that doubles as a [`TransactionManager`].
///
/// Clones share the same records and counters.
///
/// ## Example
///
/// ```
/// use routed_rust::{InMemoryStore, TransactionManager};
///
/// let store = InMemoryStore::new();
/// let scope = store.begin().unwrap();
/// scope.put("order:1", &"Acme").unwrap();
///
/// // Nothing is visible until commit.
/// assert!(store.get::<String>("order:1").unwrap().is_none());
///
/// store.commit(scope).unwrap();
/// assert_eq!(store.get::<String>("order:1").unwrap().as_deref(), Some("Acme"));
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<HashMap<String, Record>>>,
    counters: Arc<Counters>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a committed record.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, TransactionError> {
        let records = self
            .records
            .read()
            .map_err(|_| TransactionError::LockPoisoned("read"))?;
        match records.get(key).and_then(|r| r.value.as_ref()) {
            Some(value) => decode(key, value.clone()).map(Some),
            None => Ok(None),
        }
    }

    /// Write a single record outside any scope.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), TransactionError> {
        let value = encode(key, value)?;
        let mut records = self
            .records
            .write()
            .map_err(|_| TransactionError::LockPoisoned("write"))?;
        let record = records.entry(key.to_string()).or_insert(Record {
            version: 0,
            value: None,
        });
        record.version += 1;
        record.value = Some(value);
        Ok(())
    }

    /// Committed version of `key`; `0` if it was never written.
    pub fn version(&self, key: &str) -> Result<u64, TransactionError> {
        let records = self
            .records
            .read()
            .map_err(|_| TransactionError::LockPoisoned("read"))?;
        Ok(records.get(key).map(|r| r.version).unwrap_or(0))
    }

    /// Whether a live record exists for `key`.
    pub fn contains(&self, key: &str) -> Result<bool, TransactionError> {
        let records = self
            .records
            .read()
            .map_err(|_| TransactionError::LockPoisoned("read"))?;
        Ok(records.get(key).is_some_and(|r| r.value.is_some()))
    }

    /// Keys of all live records, sorted.
    pub fn keys(&self) -> Result<Vec<String>, TransactionError> {
        let records = self
            .records
            .read()
            .map_err(|_| TransactionError::LockPoisoned("read"))?;
        let mut keys: Vec<String> = records
            .iter()
            .filter(|(_, r)| r.value.is_some())
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Number of live records.
    pub fn len(&self) -> Result<usize, TransactionError> {
        Ok(self.keys()?.len())
    }

    /// Whether the store holds no live records.
    pub fn is_empty(&self) -> Result<bool, TransactionError> {
        Ok(self.len()? == 0)
    }

    /// Scope activity so far.
    pub fn stats(&self) -> TransactionStats {
        TransactionStats {
            begun: self.counters.begun.load(Ordering::SeqCst),
            committed: self.counters.committed.load(Ordering::SeqCst),
            rolled_back: self.counters.rolled_back.load(Ordering::SeqCst),
            conflicts: self.counters.conflicts.load(Ordering::SeqCst),
        }
    }
}

impl TransactionManager for InMemoryStore {
    type Scope = StagedWrites;

    fn begin(&self) -> Result<StagedWrites, TransactionError> {
        self.counters.begun.fetch_add(1, Ordering::SeqCst);
        Ok(StagedWrites {
            store: self.clone(),
            writes: Mutex::new(IndexMap::new()),
        })
    }

    fn commit(&self, scope: StagedWrites) -> Result<(), TransactionError> {
        let writes = scope.into_writes()?;
        let mut records = self
            .records
            .write()
            .map_err(|_| TransactionError::LockPoisoned("commit"))?;

        for (key, staged) in &writes {
            let actual = records.get(key).map(|r| r.version).unwrap_or(0);
            if actual != staged.expected {
                self.counters.conflicts.fetch_add(1, Ordering::SeqCst);
                return Err(TransactionError::Conflict {
                    key: key.clone(),
                    expected: staged.expected,
                    actual,
                });
            }
        }

        let count = writes.len();
        for (key, staged) in writes {
            let record = records.entry(key).or_insert(Record {
                version: 0,
                value: None,
            });
            record.version += 1;
            record.value = staged.value;
        }

        self.counters.committed.fetch_add(1, Ordering::SeqCst);
        debug!(writes = count, "scope committed");
        Ok(())
    }

    fn rollback(&self, scope: StagedWrites) -> Result<(), TransactionError> {
        let discarded = scope.into_writes()?.len();
        self.counters.rolled_back.fetch_add(1, Ordering::SeqCst);
        debug!(discarded, "scope rolled back");
        Ok(())
    }
}

#[derive(Debug)]
struct Staged {
    expected: u64,
    value: Option<Value>,
}

/// Unit of work opened by [`InMemoryStore::begin`].
///
/// Reads see the scope's own staged writes first, then committed records.
pub struct StagedWrites {
    store: InMemoryStore,
    writes: Mutex<IndexMap<String, Staged>>,
}

impl StagedWrites {
    /// Stage a write of `value` under `key`.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), TransactionError> {
        let value = encode(key, value)?;
        self.stage(key, Some(value))
    }

    /// Stage removal of `key`.
    pub fn delete(&self, key: &str) -> Result<(), TransactionError> {
        self.stage(key, None)
    }

    /// Read `key`, preferring this scope's staged value.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, TransactionError> {
        {
            let writes = self
                .writes
                .lock()
                .map_err(|_| TransactionError::LockPoisoned("stage"))?;
            if let Some(staged) = writes.get(key) {
                return match &staged.value {
                    Some(value) => decode(key, value.clone()).map(Some),
                    None => Ok(None),
                };
            }
        }
        self.store.get(key)
    }

    /// Number of staged writes.
    pub fn len(&self) -> usize {
        self.writes
            .lock()
            .map(|w| w.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    /// Whether nothing has been staged.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stage(&self, key: &str, value: Option<Value>) -> Result<(), TransactionError> {
        let mut writes = self
            .writes
            .lock()
            .map_err(|_| TransactionError::LockPoisoned("stage"))?;
        if let Some(staged) = writes.get_mut(key) {
            staged.value = value;
            return Ok(());
        }
        let expected = self.store.version(key)?;
        trace!(key, expected, "write staged");
        writes.insert(key.to_string(), Staged { expected, value });
        Ok(())
    }

    fn into_writes(self) -> Result<IndexMap<String, Staged>, TransactionError> {
        self.writes
            .into_inner()
            .map_err(|_| TransactionError::LockPoisoned("stage"))
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<Value, TransactionError> {
    serde_json::to_value(value).map_err(|e| TransactionError::Serialization {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, TransactionError> {
    serde_json::from_value(value).map_err(|e| TransactionError::Serialization {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
