//! Core business logic module
//!
//! This module contains the banking components:
//! - `traits` - Repository abstractions for interchangeable backends
//! - `policy` - Rates, bounds and schedules
//! - `clock` - Injected wall clock
//! - `ledger` - Account balances, history and reward points
//! - `billing` - Per-card billing state machine
//! - `lending` - Personal loans
//! - `investing` - Investment products and redemption
//! - `stats` - Bank-wide statistics
//! - `audit_log` - Bounded audit trail
//! - `bank` - Façade running each operation as one transaction

pub mod audit_log;
pub mod bank;
pub mod billing;
pub mod clock;
pub mod investing;
pub mod ledger;
pub mod lending;
pub mod policy;
pub mod stats;
pub mod traits;

pub use audit_log::AuditLog;
pub use bank::{Bank, FileBank};
pub use billing::{PaymentAllocation, PayoffQuote, PurchaseReceipt, RolloverOutcome};
pub use clock::{Clock, FixedClock, SystemClock};
pub use ledger::AccountLedger;
pub use lending::{loan_total, LoanPayment};
pub use stats::BankStats;
pub use traits::{AuditStore, Repository, Versioned};
