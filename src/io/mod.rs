//! I/O module
//!
//! Handles persistence and CSV output.
//!
//! # Components
//!
//! - `records` - Record schema versions and load-time upcasting
//! - `json_store` - JSON file backends for records and the audit trail
//! - `in_memory` - In-memory backends with the same semantics
//! - `csv_format` - CSV export of accounts and history

pub mod csv_format;
pub mod in_memory;
pub mod json_store;
pub mod records;

pub use csv_format::{write_accounts_csv, write_history_csv};
pub use in_memory::{InMemoryAuditStore, InMemoryStore};
pub use json_store::{JsonAuditFile, JsonFileStore};
pub use records::{Record, SCHEMA_VERSION};
