//! Personal loan types
//!
//! Loans live on the borrower's [`Account`](crate::types::Account) record, so
//! taking or repaying one is a single-record write alongside the balance
//! movement it causes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Loan identifier, unique within one account
pub type LoanId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// Installments still owed
    Active,

    /// Fully repaid (terminal)
    PaidOff,
}

/// A personal loan with a fixed installment plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,

    /// Amount credited to the borrower
    pub principal: Decimal,

    /// Principal plus compound interest over the whole plan
    pub total: Decimal,

    /// Amount still owed
    pub outstanding: Decimal,

    /// Number of monthly installments in the plan
    pub installments: u32,

    /// Installments paid so far
    pub installments_paid: u32,

    /// Amount charged per installment
    pub installment_amount: Decimal,

    pub taken_at: DateTime<Utc>,

    pub status: LoanStatus,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }

    pub fn installments_left(&self) -> u32 {
        self.installments.saturating_sub(self.installments_paid)
    }
}
