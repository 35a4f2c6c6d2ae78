//! Runtime configuration
//!
//! Built by the CLI from flags and environment variables; the library only
//! consumes it.

use crate::core::policy::AUDIT_RETENTION;
use clap::ValueEnum;
use std::path::{Path, PathBuf};

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Configuration for a file-backed bank
#[derive(Clone, Debug, PartialEq)]
pub struct BankConfig {
    /// Directory holding `accounts.json`, `cards.json` and `audit.json`
    pub data_dir: PathBuf,

    /// Fail on corrupt files and malformed records instead of skipping them
    pub strict_records: bool,

    /// Number of audit entries kept
    pub audit_retention: usize,

    pub log_format: LogFormat,
}

impl BankConfig {
    /// Create a new BankConfig
    ///
    /// A zero `audit_retention` falls back to the default of 1000 entries.
    pub fn new(data_dir: impl Into<PathBuf>, strict_records: bool, audit_retention: usize) -> Self {
        BankConfig {
            data_dir: data_dir.into(),
            strict_records,
            audit_retention: if audit_retention == 0 {
                AUDIT_RETENTION
            } else {
                audit_retention
            },
            log_format: LogFormat::Text,
        }
    }

    pub fn with_log_format(mut self, log_format: LogFormat) -> Self {
        self.log_format = log_format;
        self
    }

    pub fn accounts_path(&self) -> PathBuf {
        self.data_dir.join("accounts.json")
    }

    pub fn cards_path(&self) -> PathBuf {
        self.data_dir.join("cards.json")
    }

    pub fn audit_path(&self) -> PathBuf {
        self.data_dir.join("audit.json")
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for BankConfig {
    fn default() -> Self {
        BankConfig::new("data", false, AUDIT_RETENTION)
    }
}
