//! Investment types
//!
//! Each product compounds at a fixed monthly rate. Holdings are kept on the
//! investor's account record and valued on demand.

use crate::types::BankError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Investment identifier, unique within one account
pub type InvestmentId = u32;

/// Investment product offered by the bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentKind {
    Savings,
    Cdb,
    Treasury,
    Stocks,
    Bitcoin,
}

impl InvestmentKind {
    pub const ALL: [InvestmentKind; 5] = [
        InvestmentKind::Savings,
        InvestmentKind::Cdb,
        InvestmentKind::Treasury,
        InvestmentKind::Stocks,
        InvestmentKind::Bitcoin,
    ];

    /// Yield per 30-day month
    pub fn monthly_rate(&self) -> Decimal {
        match self {
            InvestmentKind::Savings => dec!(0.005),
            InvestmentKind::Cdb => dec!(0.008),
            InvestmentKind::Treasury => dec!(0.01),
            InvestmentKind::Stocks => dec!(0.015),
            InvestmentKind::Bitcoin => dec!(0.02),
        }
    }

    pub fn risk(&self) -> &'static str {
        match self {
            InvestmentKind::Savings | InvestmentKind::Cdb => "low",
            InvestmentKind::Treasury => "medium",
            InvestmentKind::Stocks => "high",
            InvestmentKind::Bitcoin => "very high",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentKind::Savings => "savings",
            InvestmentKind::Cdb => "cdb",
            InvestmentKind::Treasury => "treasury",
            InvestmentKind::Stocks => "stocks",
            InvestmentKind::Bitcoin => "bitcoin",
        }
    }
}

impl fmt::Display for InvestmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for InvestmentKind {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        InvestmentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| BankError::UnknownInvestmentKind {
                kind: s.to_string(),
            })
    }
}

/// Money placed in one investment product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: InvestmentId,

    pub kind: InvestmentKind,

    /// Amount debited from the balance when the investment was made
    pub principal: Decimal,

    /// Monthly rate locked in at application time
    pub monthly_rate: Decimal,

    pub opened_at: DateTime<Utc>,
}

/// An investment valued at a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub investment: Investment,

    /// Principal plus accrued yield, rounded to cents
    pub value: Decimal,

    /// `value - principal`
    pub earnings: Decimal,
}
