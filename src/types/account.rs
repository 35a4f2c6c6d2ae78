//! Account-related types for the bank simulation
//!
//! This module defines the Account record and the entries of its
//! append-only transaction history.

use crate::types::{Investment, Loan};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account identifier (unique username)
pub type Username = String;

/// One line of an account's transaction history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEntry {
    /// When the movement happened
    pub timestamp: DateTime<Utc>,

    /// Human-readable tag (`DEPOSIT`, `CARD PAYMENT 4000...`, ...)
    pub description: String,

    /// Signed amount: positive for credits, negative for debits
    pub amount: Decimal,
}

/// Customer account state
///
/// Holds the checking balance, the reward-point counter, the ordered
/// transaction history, and the loans and investments of the customer.
/// History entries are only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique username
    pub username: Username,

    /// Checking balance, never negative
    pub balance: Decimal,

    /// Reward points earned from card purchases
    pub reward_points: u64,

    /// Transaction history, oldest first
    pub history: Vec<TransactionEntry>,

    /// Sign-up timestamp
    pub created_at: DateTime<Utc>,

    /// Loans ever taken, paid-off ones included
    #[serde(default)]
    pub loans: Vec<Loan>,

    /// Open investments; redeemed ones are removed
    #[serde(default)]
    pub investments: Vec<Investment>,

    /// Optimistic concurrency stamp, bumped by the store on every save
    #[serde(default)]
    pub version: u64,
}

impl Account {
    /// Create a new account with zero balance and no points
    ///
    /// # Arguments
    ///
    /// * `username` - The unique username for this account
    /// * `created_at` - Sign-up timestamp
    pub fn new(username: &str, created_at: DateTime<Utc>) -> Self {
        Account {
            username: username.to_string(),
            balance: Decimal::ZERO,
            reward_points: 0,
            history: Vec::new(),
            created_at,
            loans: Vec::new(),
            investments: Vec::new(),
            version: 0,
        }
    }
}
