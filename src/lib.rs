//! Rust Bank Billing Library
//! # Overview
//!
//! This library provides a single-user bank simulation centred on a
//! credit-card billing engine, with the account ledger and audit trail it
//! depends on, persisted as versioned JSON records.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, CreditCard, AuditEntry, errors)
//! - [`cli`] - CLI arguments parsing
//! - [`config`] - Runtime configuration
//! - [`core`] - Business logic components:
//!   - [`core::ledger`] - Balances, transaction history and reward points
//!   - [`core::billing`] - Installments, rollover, interest, payments and payoff
//!   - [`core::lending`] - Personal loans at 2% a month
//!   - [`core::investing`] - Investment products, valuation and redemption
//!   - [`core::stats`] - Bank-wide statistics
//!   - [`core::audit_log`] - Bounded audit trail
//!   - [`core::bank`] - Façade running each operation as one transaction
//! - [`io`] - JSON record stores, schema upcasting and CSV export
//!
//! # Card Lifecycle
//!
//! - **Purchase**: split into 1–24 installments with a tiered surcharge; the
//!   first installment is billed immediately
//! - **Rollover**: before every card operation, interest accrues on the bill
//!   and installments that fell due are folded into it
//! - **Payment**: settles billed installments earliest due first
//! - **Payoff**: settles every outstanding installment at a 10% discount
//!
//! # Account State
//!
//! Each account maintains:
//! - `balance`: Checking balance, never negative
//! - `reward_points`: One point per 10 spent on cards
//! - `history`: Append-only list of signed movements
//! - `loans`: Loans taken, with their repayment progress
//! - `investments`: Open investments

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod types;

pub use config::{BankConfig, LogFormat};
pub use crate::core::{
    AccountLedger, AuditLog, Bank, BankStats, Clock, FileBank, FixedClock, SystemClock,
};
pub use io::{write_accounts_csv, write_history_csv};
pub use types::{
    Account, AuditAction, AuditEntry, BankError, CreditCard, Investment, InvestmentKind, Loan,
    StoreError,
};
