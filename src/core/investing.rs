//! Investments
//!
//! Money moved from the balance into an [`InvestmentKind`] compounds at
//! the product's monthly rate for every full 30-day month held, with simple
//! pro-rata yield for the days of the month in progress. Redemption credits
//! the whole current value and closes the investment.

use crate::core::policy::{round_money, INVESTMENT_MONTH_DAYS};
use crate::types::{Account, BankError, Holding, Investment, InvestmentId, InvestmentKind};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

impl Investment {
    /// Principal plus accrued yield at `now`, rounded to cents
    pub fn value_at(&self, now: DateTime<Utc>) -> Decimal {
        let days = (now - self.opened_at).num_days().max(0);
        let months = days / INVESTMENT_MONTH_DAYS;
        let rest = days % INVESTMENT_MONTH_DAYS;

        let growth = Decimal::ONE + self.monthly_rate;
        let compounded = (0..months).fold(self.principal, |acc, _| acc * growth);
        let partial = Decimal::ONE
            + self.monthly_rate * Decimal::from(rest) / Decimal::from(INVESTMENT_MONTH_DAYS);

        round_money(compounded * partial)
    }

    pub fn holding(&self, now: DateTime<Utc>) -> Holding {
        let value = self.value_at(now);
        Holding {
            investment: self.clone(),
            value,
            earnings: value - self.principal,
        }
    }
}

impl Account {
    /// Move `amount` from the balance into a new investment
    ///
    /// # Errors
    ///
    /// `InvalidAmount` / `InsufficientFunds` from the debit.
    pub fn invest(
        &mut self,
        kind: InvestmentKind,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<Investment, BankError> {
        let id = self.investments.iter().map(|i| i.id).max().unwrap_or(0) + 1;
        self.debit(amount, &format!("INVESTMENT #{id} {kind}"), at)?;

        let investment = Investment {
            id,
            kind,
            principal: amount,
            monthly_rate: kind.monthly_rate(),
            opened_at: at,
        };
        self.investments.push(investment.clone());
        Ok(investment)
    }

    /// Every open investment valued at `now`
    pub fn portfolio(&self, now: DateTime<Utc>) -> Vec<Holding> {
        self.investments.iter().map(|i| i.holding(now)).collect()
    }

    /// Close an investment and credit its current value
    ///
    /// # Errors
    ///
    /// `InvestmentNotFound` if no open investment has this id.
    pub fn redeem_investment(
        &mut self,
        id: InvestmentId,
        at: DateTime<Utc>,
    ) -> Result<Holding, BankError> {
        let idx = self
            .investments
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| BankError::investment_not_found(&self.username, id))?;

        let holding = self.investments[idx].holding(at);
        self.credit(
            holding.value,
            &format!("REDEMPTION #{id} {}", holding.investment.kind),
            at,
        )?;
        self.investments.remove(idx);

        Ok(holding)
    }
}
