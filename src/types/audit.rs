//! Audit-trail types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of action recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    AccountOpened,
    Deposit,
    Withdrawal,
    Transfer,
    PointsRedeemed,
    CardIssued,
    CardPurchase,
    BillPayment,
    DebtPayoff,
    LoanTaken,
    LoanInstallmentPaid,
    LoanPaidOff,
    InvestmentMade,
    InvestmentRedeemed,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::AccountOpened => "ACCOUNT_OPENED",
            AuditAction::Deposit => "DEPOSIT",
            AuditAction::Withdrawal => "WITHDRAWAL",
            AuditAction::Transfer => "TRANSFER",
            AuditAction::PointsRedeemed => "POINTS_REDEEMED",
            AuditAction::CardIssued => "CARD_ISSUED",
            AuditAction::CardPurchase => "CARD_PURCHASE",
            AuditAction::BillPayment => "BILL_PAYMENT",
            AuditAction::DebtPayoff => "DEBT_PAYOFF",
            AuditAction::LoanTaken => "LOAN_TAKEN",
            AuditAction::LoanInstallmentPaid => "LOAN_INSTALLMENT_PAID",
            AuditAction::LoanPaidOff => "LOAN_PAID_OFF",
            AuditAction::InvestmentMade => "INVESTMENT_MADE",
            AuditAction::InvestmentRedeemed => "INVESTMENT_REDEEMED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub account: String,
    pub action: AuditAction,
    pub details: String,
}
