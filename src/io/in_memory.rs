//! In-memory backends
//!
//! Same semantics as the JSON file stores (full-record saves, version
//! stamps) without touching the filesystem. Used by tests and benchmarks.

use crate::core::traits::{AuditStore, Repository};
use crate::io::records::Record;
use crate::types::{AuditEntry, StoreError};
use std::collections::BTreeMap;

/// Keyed record store backed by a `BTreeMap`
///
/// An optional save budget makes every save past the first `n` fail, to
/// exercise partially written multi-record operations.
#[derive(Debug, Clone)]
pub struct InMemoryStore<T> {
    records: BTreeMap<String, T>,
    save_budget: Option<usize>,
}

impl<T> InMemoryStore<T> {
    pub fn new() -> Self {
        InMemoryStore {
            records: BTreeMap::new(),
            save_budget: None,
        }
    }

    /// Store that accepts `saves` writes and rejects the rest
    pub fn with_save_budget(saves: usize) -> Self {
        InMemoryStore {
            records: BTreeMap::new(),
            save_budget: Some(saves),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Repository<T> for InMemoryStore<T> {
    fn load(&self, key: &str) -> Result<Option<T>, StoreError> {
        Ok(self.records.get(key).cloned())
    }

    fn load_all(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.records.values().cloned().collect())
    }

    fn save(&mut self, key: &str, record: &mut T) -> Result<(), StoreError> {
        self.check_version(key, record)?;
        if let Some(budget) = self.save_budget.as_mut() {
            if *budget == 0 {
                return Err(StoreError::Io {
                    path: "<memory>".to_string(),
                    message: format!("{} store is read-only", T::KIND),
                });
            }
            *budget -= 1;
        }
        record.set_version(record.version() + 1);
        self.records.insert(key.to_string(), record.clone());
        Ok(())
    }

    fn kind(&self) -> &'static str {
        T::KIND
    }
}

/// Audit store backed by a `Vec`
///
/// `fail_writes` makes every store call fail, to exercise the
/// never-fail contract of the audit log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditStore {
    entries: Vec<AuditEntry>,
    fail_writes: bool,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        InMemoryAuditStore {
            entries: Vec::new(),
            fail_writes: true,
        }
    }
}

impl AuditStore for InMemoryAuditStore {
    fn load_entries(&self) -> Result<Vec<AuditEntry>, StoreError> {
        Ok(self.entries.clone())
    }

    fn store_entries(&mut self, entries: &[AuditEntry]) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Io {
                path: "<memory>".to_string(),
                message: "audit store is read-only".to_string(),
            });
        }
        self.entries = entries.to_vec();
        Ok(())
    }
}
