//! Error types for the bank simulation
//!
//! This module defines every error that a bank operation can report.
//! Errors are descriptive enough to be printed directly by the CLI.
//!
//! # Error Categories
//!
//! - **Validation Errors**: Invalid amounts, installment counts, usernames, etc.
//! - **Business Rule Errors**: Insufficient funds, credit limit exceeded, no pending debt, etc.
//! - **Ownership Errors**: Unknown cards, accounts, loans or investments, cards used by someone other than the owner
//! - **Storage Errors**: I/O failures, corrupt files, stale record versions

use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for bank operations
///
/// Every variant is a recoverable, synchronous failure: the operation that
/// produced it has mutated nothing and persisted nothing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BankError {
    /// Amount is zero or negative
    #[error("Invalid amount {amount} for {operation}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
        /// Operation that received it
        operation: String,
    },

    /// Installment count outside the accepted range
    #[error("Invalid installment count {count}: must be between {min} and {max}")]
    InvalidInstallmentCount {
        /// Requested installment count
        count: u32,
        /// Smallest accepted count
        min: u32,
        /// Largest accepted count
        max: u32,
    },

    /// Account balance cannot cover a debit
    #[error(
        "Insufficient funds for account {account}: available {available}, requested {requested}"
    )]
    InsufficientFunds {
        /// Username of the account
        account: String,
        /// Current balance
        available: Decimal,
        /// Requested debit amount
        requested: Decimal,
    },

    /// Purchase not approved because of the card's available credit
    #[error("Credit limit exceeded on card {card}: available {available}, requested {requested}")]
    LimitExceeded {
        /// Card number
        card: String,
        /// Available credit at the time of the purchase
        available: Decimal,
        /// Requested purchase amount
        requested: Decimal,
    },

    /// Payment larger than the current bill
    #[error("Payment of {requested} exceeds the current bill {bill} on card {card}")]
    AmountExceedsBill {
        /// Card number
        card: String,
        /// Current bill amount
        bill: Decimal,
        /// Requested payment amount
        requested: Decimal,
    },

    /// Payoff requested on a card that owes nothing
    #[error("No debt pending on card {card}")]
    NoDebtPending {
        /// Card number
        card: String,
    },

    /// Card number not found
    #[error("Card {card} not found")]
    CardNotFound {
        /// Card number that was not found
        card: String,
    },

    /// Card used by an account that does not own it
    #[error("Card {card} does not belong to account {account}")]
    NotCardOwner {
        /// Card number
        card: String,
        /// Account that attempted the operation
        account: String,
    },

    /// Username not found
    #[error("Account {account} not found")]
    AccountNotFound {
        /// Username that was not found
        account: String,
    },

    /// Username already taken at sign-up
    #[error("Account {account} already exists")]
    AccountAlreadyExists {
        /// Username that is taken
        account: String,
    },

    /// Blank username at sign-up
    #[error("Invalid username '{username}'")]
    InvalidUsername {
        /// The rejected username
        username: String,
    },

    /// Transfer whose sender and receiver are the same account
    #[error("Invalid transfer from account {account} to itself")]
    InvalidTransfer {
        /// Username of the account
        account: String,
    },

    /// Owner already holds the maximum number of cards
    #[error("Account {account} already holds the maximum of {max} cards")]
    CardLimitReached {
        /// Username of the owner
        account: String,
        /// Maximum number of cards per account
        max: usize,
    },

    /// Points redemption that is not a positive multiple of the redemption block
    #[error("Invalid redemption of {points} points: {reason}")]
    InvalidRedemption {
        /// Requested points
        points: u64,
        /// Why it was rejected
        reason: String,
    },

    /// Account does not hold enough reward points
    #[error(
        "Insufficient points for account {account}: available {available}, requested {requested}"
    )]
    InsufficientPoints {
        /// Username of the account
        account: String,
        /// Points held
        available: u64,
        /// Points requested
        requested: u64,
    },

    /// Balance too low to qualify for any loan
    #[error("Account {account} is not eligible for a loan: limit {limit} is below {minimum}")]
    LoanNotEligible {
        /// Username of the account
        account: String,
        /// Loan limit derived from the balance
        limit: Decimal,
        /// Smallest limit that qualifies
        minimum: Decimal,
    },

    /// Loan request above the account's loan limit
    #[error("Loan of {requested} exceeds the limit {limit} for account {account}")]
    LoanLimitExceeded {
        /// Username of the account
        account: String,
        /// Loan limit derived from the balance
        limit: Decimal,
        /// Requested principal
        requested: Decimal,
    },

    /// No active loan with this id on the account
    #[error("No active loan {loan} on account {account}")]
    LoanNotFound {
        /// Username of the account
        account: String,
        /// Requested loan id
        loan: u32,
    },

    /// No open investment with this id on the account
    #[error("Investment {investment} not found on account {account}")]
    InvestmentNotFound {
        /// Username of the account
        account: String,
        /// Requested investment id
        investment: u32,
    },

    /// Investment product name not offered
    #[error("Unknown investment type '{kind}'")]
    UnknownInvestmentKind {
        /// The rejected name
        kind: String,
    },

    /// Persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Persistence errors raised at the repository boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// I/O error while reading or writing a backing file
    #[error("I/O error on {path}: {message}")]
    Io {
        /// File that failed
        path: String,
        /// Description of the I/O error
        message: String,
    },

    /// Backing file is not valid JSON of the expected shape
    #[error("Corrupt store {path}: {message}")]
    Corrupt {
        /// File that failed to parse
        path: String,
        /// Parser message
        message: String,
    },

    /// A single record failed validation at load time
    #[error("Malformed {kind} record '{key}': {message}")]
    MalformedRecord {
        /// Record kind (account, card, ...)
        kind: String,
        /// Key of the record
        key: String,
        /// Why it was rejected
        message: String,
    },

    /// Optimistic concurrency check failed
    #[error("Version conflict on {kind} '{key}': expected {expected}, found {found}")]
    VersionConflict {
        /// Record kind
        kind: String,
        /// Key of the record
        key: String,
        /// Version the writer started from
        expected: u64,
        /// Version currently stored
        found: u64,
    },

    /// Record could not be serialized
    #[error("Serialization error: {message}")]
    Serialization {
        /// Serializer message
        message: String,
    },
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Serialization {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl BankError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal, operation: &str) -> Self {
        BankError::InvalidAmount {
            amount,
            operation: operation.to_string(),
        }
    }

    /// Create an InvalidInstallmentCount error
    pub fn invalid_installment_count(count: u32, min: u32, max: u32) -> Self {
        BankError::InvalidInstallmentCount { count, min, max }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: &str, available: Decimal, requested: Decimal) -> Self {
        BankError::InsufficientFunds {
            account: account.to_string(),
            available,
            requested,
        }
    }

    /// Create a LimitExceeded error
    pub fn limit_exceeded(card: &str, available: Decimal, requested: Decimal) -> Self {
        BankError::LimitExceeded {
            card: card.to_string(),
            available,
            requested,
        }
    }

    /// Create an AmountExceedsBill error
    pub fn amount_exceeds_bill(card: &str, bill: Decimal, requested: Decimal) -> Self {
        BankError::AmountExceedsBill {
            card: card.to_string(),
            bill,
            requested,
        }
    }

    /// Create a NoDebtPending error
    pub fn no_debt_pending(card: &str) -> Self {
        BankError::NoDebtPending {
            card: card.to_string(),
        }
    }

    /// Create a CardNotFound error
    pub fn card_not_found(card: &str) -> Self {
        BankError::CardNotFound {
            card: card.to_string(),
        }
    }

    /// Create a NotCardOwner error
    pub fn not_card_owner(card: &str, account: &str) -> Self {
        BankError::NotCardOwner {
            card: card.to_string(),
            account: account.to_string(),
        }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(account: &str) -> Self {
        BankError::AccountNotFound {
            account: account.to_string(),
        }
    }

    /// Create an AccountAlreadyExists error
    pub fn account_already_exists(account: &str) -> Self {
        BankError::AccountAlreadyExists {
            account: account.to_string(),
        }
    }

    /// Create an InvalidRedemption error
    pub fn invalid_redemption(points: u64, reason: &str) -> Self {
        BankError::InvalidRedemption {
            points,
            reason: reason.to_string(),
        }
    }

    /// Create an InsufficientPoints error
    pub fn insufficient_points(account: &str, available: u64, requested: u64) -> Self {
        BankError::InsufficientPoints {
            account: account.to_string(),
            available,
            requested,
        }
    }

    /// Create a LoanNotFound error
    pub fn loan_not_found(account: &str, loan: u32) -> Self {
        BankError::LoanNotFound {
            account: account.to_string(),
            loan,
        }
    }

    /// Create an InvestmentNotFound error
    pub fn investment_not_found(account: &str, investment: u32) -> Self {
        BankError::InvestmentNotFound {
            account: account.to_string(),
            investment,
        }
    }
}

impl StoreError {
    /// Create an Io error for a path
    pub fn io(path: &std::path::Path, error: &std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            message: error.to_string(),
        }
    }

    /// Create a MalformedRecord error
    pub fn malformed(kind: &str, key: &str, message: impl Into<String>) -> Self {
        StoreError::MalformedRecord {
            kind: kind.to_string(),
            key: key.to_string(),
            message: message.into(),
        }
    }

    /// Create a VersionConflict error
    pub fn version_conflict(kind: &str, key: &str, expected: u64, found: u64) -> Self {
        StoreError::VersionConflict {
            kind: kind.to_string(),
            key: key.to_string(),
            expected,
            found,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case::invalid_amount(
        BankError::InvalidAmount { amount: dec!(-5), operation: "deposit".to_string() },
        "Invalid amount -5 for deposit"
    )]
    #[case::invalid_installment_count(
        BankError::InvalidInstallmentCount { count: 30, min: 1, max: 24 },
        "Invalid installment count 30: must be between 1 and 24"
    )]
    #[case::insufficient_funds(
        BankError::InsufficientFunds { account: "ana".to_string(), available: dec!(10.00), requested: dec!(25.50) },
        "Insufficient funds for account ana: available 10.00, requested 25.50"
    )]
    #[case::limit_exceeded(
        BankError::LimitExceeded { card: "4000".to_string(), available: dec!(400), requested: dec!(500) },
        "Credit limit exceeded on card 4000: available 400, requested 500"
    )]
    #[case::amount_exceeds_bill(
        BankError::AmountExceedsBill { card: "4000".to_string(), bill: dec!(100), requested: dec!(150) },
        "Payment of 150 exceeds the current bill 100 on card 4000"
    )]
    #[case::no_debt_pending(
        BankError::NoDebtPending { card: "4000".to_string() },
        "No debt pending on card 4000"
    )]
    #[case::not_card_owner(
        BankError::NotCardOwner { card: "4000".to_string(), account: "bob".to_string() },
        "Card 4000 does not belong to account bob"
    )]
    #[case::loan_limit_exceeded(
        BankError::LoanLimitExceeded { account: "ana".to_string(), limit: dec!(500), requested: dec!(800) },
        "Loan of 800 exceeds the limit 500 for account ana"
    )]
    #[case::loan_not_found(
        BankError::LoanNotFound { account: "ana".to_string(), loan: 3 },
        "No active loan 3 on account ana"
    )]
    #[case::version_conflict(
        BankError::Store(StoreError::VersionConflict { kind: "account".to_string(), key: "ana".to_string(), expected: 1, found: 2 }),
        "Version conflict on account 'ana': expected 1, found 2"
    )]
    fn test_error_display(#[case] error: BankError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::insufficient_funds(
        BankError::insufficient_funds("ana", dec!(1), dec!(2)),
        BankError::InsufficientFunds { account: "ana".to_string(), available: dec!(1), requested: dec!(2) }
    )]
    #[case::card_not_found(
        BankError::card_not_found("4000123"),
        BankError::CardNotFound { card: "4000123".to_string() }
    )]
    #[case::limit_exceeded(
        BankError::limit_exceeded("4000", dec!(400), dec!(500)),
        BankError::LimitExceeded { card: "4000".to_string(), available: dec!(400), requested: dec!(500) }
    )]
    fn test_helper_functions(#[case] result: BankError, #[case] expected: BankError) {
        assert_eq!(result, expected);
    }

    #[test]
    fn test_store_error_conversion() {
        let error: BankError = StoreError::version_conflict("card", "4000", 3, 4).into();
        assert!(matches!(
            error,
            BankError::Store(StoreError::VersionConflict { expected: 3, found: 4, .. })
        ));
    }
}
