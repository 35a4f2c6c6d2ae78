//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account record and transaction history entries
//! - `card`: Credit card, installment schedule and statement views
//! - `loan`: Personal loans held on an account
//! - `investment`: Investment products and holdings
//! - `audit`: Audit trail entries
//! - `error`: Error types for bank operations and persistence

pub mod account;
pub mod audit;
pub mod card;
pub mod error;
pub mod investment;
pub mod loan;

pub use account::{Account, TransactionEntry, Username};
pub use audit::{AuditAction, AuditEntry};
pub use card::{
    CardNumber, CardSummary, CreditCard, Installment, InstallmentState, Statement, StatementLine,
};
pub use error::{BankError, StoreError};
pub use investment::{Holding, Investment, InvestmentId, InvestmentKind};
pub use loan::{Loan, LoanId, LoanStatus};
