//! JSON file backends
//!
//! Each record kind lives in one pretty-printed JSON file holding a map from
//! key to record. Every save rewrites the whole file through a temporary
//! sibling and a rename, so a crash never leaves a half-written file behind.
//!
//! # Loading modes
//!
//! - **Lenient** (default): a missing or unparseable file loads as empty, and
//!   records that fail to decode are skipped. Both are logged as warnings.
//! - **Strict**: the same conditions are reported as [`StoreError`]s.

use crate::core::traits::{AuditStore, Repository};
use crate::io::records::{self, Record, SCHEMA_FIELD, SCHEMA_VERSION};
use crate::types::{AuditEntry, StoreError};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read and parse a JSON file
///
/// Returns `Ok(None)` when the file does not exist, or when it is corrupt
/// and `strict` is off.
fn read_json(path: &Path, strict: bool) -> Result<Option<Value>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, &e)),
    };

    match serde_json::from_str(&text) {
        Ok(value) => Ok(Some(value)),
        Err(e) if strict => Err(StoreError::Corrupt {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Corrupt store file, starting empty");
            Ok(None)
        }
    }
}

/// Write a JSON value through a temporary file and rename it into place
fn write_json(path: &Path, value: &Value) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, &e))?;
    }

    let text = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, text).map_err(|e| StoreError::io(&tmp, &e))?;
    fs::rename(&tmp, path).map_err(|e| StoreError::io(path, &e))?;
    Ok(())
}

/// Keyed record store persisted as one JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore<T> {
    path: PathBuf,
    strict: bool,
    _record: PhantomData<T>,
}

impl<T: Record> JsonFileStore<T> {
    /// Create a store over `path`; the file is created on first save
    ///
    /// # Arguments
    ///
    /// * `path` - Backing JSON file
    /// * `strict` - Reject corrupt files and malformed records instead of skipping them
    pub fn new(path: impl Into<PathBuf>, strict: bool) -> Self {
        JsonFileStore {
            path: path.into(),
            strict,
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, T>, StoreError> {
        let mut records = BTreeMap::new();

        let entries = match read_json(&self.path, self.strict)? {
            None => return Ok(records),
            Some(Value::Object(entries)) => entries,
            Some(other) => {
                let message = format!("expected an object of {} records", T::KIND);
                if self.strict {
                    return Err(StoreError::Corrupt {
                        path: self.path.display().to_string(),
                        message,
                    });
                }
                warn!(path = %self.path.display(), found = %other, "{message}, starting empty");
                return Ok(records);
            }
        };

        for (key, raw) in entries {
            match records::decode::<T>(&key, raw) {
                Ok(record) => {
                    records.insert(key, record);
                }
                Err(e) if self.strict => return Err(e),
                Err(e) => warn!(kind = T::KIND, key = %key, error = %e, "Skipping malformed record"),
            }
        }

        Ok(records)
    }

    fn write_all(&self, records: &BTreeMap<String, T>) -> Result<(), StoreError> {
        let mut map = Map::new();
        for (key, record) in records {
            map.insert(key.clone(), records::encode(record)?);
        }
        write_json(&self.path, &Value::Object(map))
    }
}

impl<T: Record> Repository<T> for JsonFileStore<T> {
    fn load(&self, key: &str) -> Result<Option<T>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn load_all(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.read_all()?.into_values().collect())
    }

    fn save(&mut self, key: &str, record: &mut T) -> Result<(), StoreError> {
        let mut records = self.read_all()?;

        let found = records.get(key).map(|r| r.version()).unwrap_or(0);
        if found != record.version() {
            return Err(StoreError::version_conflict(
                T::KIND,
                key,
                record.version(),
                found,
            ));
        }

        let mut stored = record.clone();
        stored.set_version(found + 1);
        records.insert(key.to_string(), stored);
        self.write_all(&records)?;

        record.set_version(found + 1);
        debug!(kind = T::KIND, key, version = found + 1, "Record saved");
        Ok(())
    }

    fn kind(&self) -> &'static str {
        T::KIND
    }
}

/// Audit trail persisted as one JSON file
///
/// Current layout is `{"schema_version": 1, "entries": [...]}`. A bare array
/// is read as the legacy layout; legacy actions with no counterpart here are
/// dropped on load.
#[derive(Debug, Clone)]
pub struct JsonAuditFile {
    path: PathBuf,
    strict: bool,
}

impl JsonAuditFile {
    pub fn new(path: impl Into<PathBuf>, strict: bool) -> Self {
        JsonAuditFile {
            path: path.into(),
            strict,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditStore for JsonAuditFile {
    fn load_entries(&self) -> Result<Vec<AuditEntry>, StoreError> {
        let (schema, raw_entries) = match read_json(&self.path, self.strict)? {
            None => return Ok(Vec::new()),
            Some(Value::Array(items)) => (0, items),
            Some(Value::Object(mut map)) => {
                let schema = map.get(SCHEMA_FIELD).and_then(Value::as_u64).unwrap_or(0);
                match map.remove("entries") {
                    Some(Value::Array(items)) => (schema, items),
                    _ => (schema, Vec::new()),
                }
            }
            Some(_) if self.strict => {
                return Err(StoreError::Corrupt {
                    path: self.path.display().to_string(),
                    message: "expected an audit entry list".to_string(),
                })
            }
            Some(_) => {
                warn!(path = %self.path.display(), "Unrecognized audit file, starting empty");
                return Ok(Vec::new());
            }
        };

        let total = raw_entries.len();
        let entries: Vec<AuditEntry> = raw_entries
            .into_iter()
            .filter_map(|raw| records::upcast_audit_entry(raw, schema))
            .collect();

        if entries.len() < total {
            debug!(
                path = %self.path.display(),
                dropped = total - entries.len(),
                "Dropped audit entries that could not be upcast"
            );
        }

        Ok(entries)
    }

    fn store_entries(&mut self, entries: &[AuditEntry]) -> Result<(), StoreError> {
        let value = json!({
            SCHEMA_FIELD: SCHEMA_VERSION,
            "entries": entries,
        });
        write_json(&self.path, &value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Account, AuditAction};
    use chrono::Utc;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn account_store(dir: &TempDir, strict: bool) -> JsonFileStore<Account> {
        JsonFileStore::new(dir.path().join("accounts.json"), strict)
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = account_store(&dir, true);

        assert!(store.load_all().unwrap().is_empty());
        assert_eq!(store.load("ana").unwrap(), None);
    }

    #[test]
    fn test_save_then_reload_from_disk() {
        let dir = TempDir::new().unwrap();
        let mut store = account_store(&dir, false);
        let mut account = Account::new("ana", Utc::now());
        account.balance = dec!(42.50);

        store.save("ana", &mut account).unwrap();

        let reopened = account_store(&dir, true);
        let loaded = reopened.load("ana").unwrap().unwrap();
        assert_eq!(loaded.balance, dec!(42.50));
        assert_eq!(loaded.version, 1);
        assert_eq!(account.version, 1);

        let text = fs::read_to_string(dir.path().join("accounts.json")).unwrap();
        assert!(text.contains("\"schema_version\": 1"));
    }

    #[test]
    fn test_stale_version_is_rejected_and_file_untouched() {
        let dir = TempDir::new().unwrap();
        let mut store = account_store(&dir, false);
        let mut account = Account::new("ana", Utc::now());
        store.save("ana", &mut account).unwrap();

        let mut stale = account.clone();
        account.balance = dec!(10);
        store.save("ana", &mut account).unwrap();
        stale.balance = dec!(99);
        let result = store.save("ana", &mut stale);

        assert!(matches!(
            result,
            Err(StoreError::VersionConflict {
                expected: 1,
                found: 2,
                ..
            })
        ));
        assert_eq!(store.load("ana").unwrap().unwrap().balance, dec!(10));
    }

    #[rstest]
    #[case::lenient(false)]
    #[case::strict(true)]
    fn test_corrupt_file(#[case] strict: bool) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("accounts.json"), "{ not json").unwrap();
        let store = account_store(&dir, strict);

        let result = store.load_all();

        if strict {
            assert!(matches!(result, Err(StoreError::Corrupt { .. })));
        } else {
            assert!(result.unwrap().is_empty());
        }
    }

    #[rstest]
    #[case::lenient(false)]
    #[case::strict(true)]
    fn test_malformed_record(#[case] strict: bool) {
        let dir = TempDir::new().unwrap();
        let contents = json!({
            "ana": {
                "schema_version": 1,
                "username": "ana",
                "balance": "5.00",
                "created_at": "2024-03-01T10:00:00Z"
            },
            "bob": { "schema_version": 1, "balance": [] }
        });
        fs::write(dir.path().join("accounts.json"), contents.to_string()).unwrap();
        let store = account_store(&dir, strict);

        let result = store.load_all();

        if strict {
            assert!(matches!(result, Err(StoreError::MalformedRecord { .. })));
        } else {
            let accounts = result.unwrap();
            assert_eq!(accounts.len(), 1);
            assert_eq!(accounts[0].username, "ana");
        }
    }

    #[test]
    fn test_audit_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut audit = JsonAuditFile::new(dir.path().join("audit.json"), true);
        let entry = AuditEntry {
            timestamp: Utc::now(),
            account: "ana".to_string(),
            action: AuditAction::Deposit,
            details: "Deposit of 10.00".to_string(),
        };

        audit.store_entries(std::slice::from_ref(&entry)).unwrap();

        assert_eq!(audit.load_entries().unwrap(), vec![entry]);
    }

    #[test]
    fn test_legacy_audit_array_is_upcast() {
        let dir = TempDir::new().unwrap();
        let legacy = json!([
            { "timestamp": "2024-03-10T14:30:00", "usuario": "ana",
              "acao": "SAQUE", "detalhes": "Saque de R$ 20.00", "ip": "127.0.0.1" },
            { "timestamp": "2024-03-10T14:31:00", "usuario": "ana",
              "acao": "LOGIN", "detalhes": "", "ip": "127.0.0.1" }
        ]);
        fs::write(dir.path().join("audit.json"), legacy.to_string()).unwrap();
        let audit = JsonAuditFile::new(dir.path().join("audit.json"), false);

        let entries = audit.load_entries().unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Withdrawal);
    }
}
