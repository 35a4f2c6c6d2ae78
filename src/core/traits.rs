//! Core traits for persistence
//!
//! This module defines the repository abstractions that the ledger, the
//! billing engine and the audit log are written against, so that JSON-file
//! and in-memory backends can be used interchangeably.

use crate::types::{Account, AuditEntry, CreditCard, StoreError};

/// Records that carry an optimistic concurrency stamp
pub trait Versioned {
    /// Version the record was loaded at (0 for a record never saved)
    fn version(&self) -> u64;

    /// Overwrite the version, used by stores after a successful save
    fn set_version(&mut self, version: u64);
}

impl Versioned for Account {
    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl Versioned for CreditCard {
    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

/// Keyed record repository
///
/// Load and save always work on full records; there are no partial updates.
/// `save` implements optimistic concurrency: the record's version must match
/// the stored version (0 when absent), and is incremented on success.
pub trait Repository<T: Versioned + Clone> {
    /// Load a record by key
    fn load(&self, key: &str) -> Result<Option<T>, StoreError>;

    /// Load every record, ordered by key
    fn load_all(&self) -> Result<Vec<T>, StoreError>;

    /// Write a record back, bumping its version
    fn save(&mut self, key: &str, record: &mut T) -> Result<(), StoreError>;

    /// Kind name used in error messages
    fn kind(&self) -> &'static str;

    /// Fail with a version conflict if `record` is stale
    fn check_version(&self, key: &str, record: &T) -> Result<(), StoreError> {
        let found = self.load(key)?.map(|r| r.version()).unwrap_or(0);
        if found != record.version() {
            return Err(StoreError::version_conflict(
                self.kind(),
                key,
                record.version(),
                found,
            ));
        }
        Ok(())
    }
}

/// Backing storage for the bounded audit trail
pub trait AuditStore {
    /// Load all retained entries, oldest first
    fn load_entries(&self) -> Result<Vec<AuditEntry>, StoreError>;

    /// Replace the stored entries
    fn store_entries(&mut self, entries: &[AuditEntry]) -> Result<(), StoreError>;
}
