//! Credit-card types for the bank simulation
//!
//! This module defines the CreditCard record and its installment schedule.
//! The billing rules that mutate these types live in `core::billing`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Card identifier (opaque, `4000` followed by 12 digits when generated)
pub type CardNumber = String;

/// Lifecycle state of an installment, derived from its flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallmentState {
    /// Not yet due and not folded into the bill
    Future,

    /// Folded into the current bill and not fully paid
    InBill,

    /// Fully paid (terminal)
    Paid,
}

/// One scheduled fraction of a financed purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    /// Position in the schedule (1..=count)
    pub sequence: u32,

    /// Total number of installments of the purchase
    pub count: u32,

    /// Amount owed for this installment (interest included)
    pub amount: Decimal,

    /// Amount already paid, `0 <= paid_amount <= amount`
    pub paid_amount: Decimal,

    /// Date the installment becomes part of the bill
    pub due_date: NaiveDate,

    /// Set once the installment has been folded into the current bill
    pub moved_to_bill: bool,

    /// Set once `paid_amount == amount`; implies `moved_to_bill`
    pub paid: bool,

    /// Original purchase amount, before the installment surcharge
    pub purchase_amount: Decimal,

    /// Purchase description
    pub description: String,
}

impl Installment {
    /// Current lifecycle state
    pub fn state(&self) -> InstallmentState {
        if self.paid {
            InstallmentState::Paid
        } else if self.moved_to_bill {
            InstallmentState::InBill
        } else {
            InstallmentState::Future
        }
    }

    /// Amount still owed on this installment
    pub fn outstanding(&self) -> Decimal {
        self.amount - self.paid_amount
    }
}

/// Credit-card state
///
/// Belongs to exactly one account. `current_bill` accumulates moved-in
/// installments and interest; `installments` is never shrunk, paid entries
/// stay as history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCard {
    /// Card number
    pub number: CardNumber,

    /// Username of the owning account
    pub owner: String,

    /// Total credit limit
    pub limit: Decimal,

    /// Running bill (installments moved in, interest accrued, minus payments)
    pub current_bill: Decimal,

    /// Date of the last bill cycle (advanced by rollover when installments move)
    pub last_bill_cycle_date: NaiveDate,

    /// Installment schedule of every purchase, in creation order
    pub installments: Vec<Installment>,

    /// Issue timestamp
    pub created_at: DateTime<Utc>,

    /// Optimistic concurrency stamp, bumped by the store on every save
    #[serde(default)]
    pub version: u64,
}

impl CreditCard {
    /// Create an empty card
    ///
    /// The bill cycle starts on the issue date.
    pub fn new(number: &str, owner: &str, limit: Decimal, created_at: DateTime<Utc>) -> Self {
        CreditCard {
            number: number.to_string(),
            owner: owner.to_string(),
            limit,
            current_bill: Decimal::ZERO,
            last_bill_cycle_date: created_at.date_naive(),
            installments: Vec::new(),
            created_at,
            version: 0,
        }
    }
}

/// Summary of a card for listings
#[derive(Debug, Clone, PartialEq)]
pub struct CardSummary {
    pub number: CardNumber,
    pub limit: Decimal,
    pub current_bill: Decimal,
    pub available_credit: Decimal,
    pub delinquent: bool,
}

/// One line of a bill statement
#[derive(Debug, Clone, PartialEq)]
pub struct StatementLine {
    pub description: String,
    pub sequence: u32,
    pub count: u32,
    pub due_date: NaiveDate,
    pub outstanding: Decimal,
}

/// Bill statement of a card, computed after rollover
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub card: CardNumber,
    pub current_bill: Decimal,
    pub due_date: NaiveDate,
    pub available_credit: Decimal,
    pub delinquent: bool,
    /// Installments currently in the bill
    pub items: Vec<StatementLine>,
    /// Installments not yet due
    pub upcoming: Vec<StatementLine>,
}
