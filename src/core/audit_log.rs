//! Bounded audit trail
//!
//! Every successful state-changing operation appends one entry. Only the
//! newest `retention` entries are kept. Recording never fails the operation
//! that triggered it: storage errors are logged and dropped.

use crate::core::policy::AUDIT_RETENTION;
use crate::core::traits::AuditStore;
use crate::types::{AuditAction, AuditEntry};
use chrono::{DateTime, Utc};
use tracing::warn;

pub struct AuditLog<S: AuditStore> {
    store: S,
    retention: usize,
}

impl<S: AuditStore> AuditLog<S> {
    pub fn new(store: S) -> Self {
        Self::with_retention(store, AUDIT_RETENTION)
    }

    /// Audit log keeping at most `retention` entries (at least one)
    pub fn with_retention(store: S, retention: usize) -> Self {
        AuditLog {
            store,
            retention: retention.max(1),
        }
    }

    /// Append an entry, evicting the oldest ones past the retention bound
    pub fn record(&mut self, account: &str, action: AuditAction, details: &str, at: DateTime<Utc>) {
        let mut entries = match self.store.load_entries() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(account, action = %action, error = %e, "Audit trail unreadable, entry dropped");
                return;
            }
        };

        entries.push(AuditEntry {
            timestamp: at,
            account: account.to_string(),
            action,
            details: details.to_string(),
        });
        if entries.len() > self.retention {
            let excess = entries.len() - self.retention;
            entries.drain(..excess);
        }

        if let Err(e) = self.store.store_entries(&entries) {
            warn!(account, action = %action, error = %e, "Audit entry could not be stored");
        }
    }

    /// All retained entries, oldest first
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.store.load_entries().unwrap_or_else(|e| {
            warn!(error = %e, "Audit trail unreadable");
            Vec::new()
        })
    }

    /// Up to `limit` entries, newest first, optionally for one account
    pub fn recent(&self, account: Option<&str>, limit: usize) -> Vec<AuditEntry> {
        self.entries()
            .into_iter()
            .rev()
            .filter(|e| account.map_or(true, |name| e.account == name))
            .take(limit)
            .collect()
    }
}
