//! Credit-card billing rules
//!
//! This module implements the per-card state machine on [`CreditCard`]:
//!
//! - **Rollover**: accrue interest on the running bill and fold due
//!   installments into it
//! - **Purchase**: approve against available credit and create the
//!   installment schedule
//! - **Payment**: allocate a payment over billed installments, earliest due first
//! - **Payoff**: settle every outstanding installment at a discount
//!
//! Installments move `Future → InBill → Paid`. The only transition that skips
//! `InBill` is the bulk settlement of a payoff.
//!
//! Every method validates before it mutates: an `Err` leaves the card untouched.
//! Ledger side effects (debits, reward points) are the caller's job.

use crate::core::policy::{
    installment_surcharge, is_cent_precise, round_money, BILL_EPSILON, DAILY_RATE, DELINQUENT_DAILY_RATE,
    INSTALLMENT_SPACING_DAYS, MAX_INSTALLMENTS, MIN_INSTALLMENTS, PAYOFF_DISCOUNT,
    STATEMENT_DUE_DAYS,
};
use crate::types::{
    BankError, CardSummary, CreditCard, Installment, InstallmentState, Statement, StatementLine,
};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

/// What a rollover changed
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RolloverOutcome {
    /// Interest added to the bill
    pub interest: Decimal,
    /// Number of installments folded into the bill
    pub moved: usize,
}

impl RolloverOutcome {
    pub fn is_noop(&self) -> bool {
        self.interest.is_zero() && self.moved == 0
    }
}

/// Result of an approved purchase
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseReceipt {
    pub amount: Decimal,
    pub count: u32,
    pub surcharge: Decimal,
    pub total_with_interest: Decimal,
    pub per_installment: Decimal,
}

/// How a payment was spread over the bill
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PaymentAllocation {
    /// Portion applied to installments
    pub allocated: Decimal,
    /// Portion applied to the bill without installment backing (interest)
    pub unallocated: Decimal,
    /// Sequence numbers of installments settled in full by this payment
    pub settled: Vec<u32>,
}

/// Discounted payoff figures
#[derive(Debug, Clone, PartialEq)]
pub struct PayoffQuote {
    /// Total owed before the discount
    pub owed: Decimal,
    /// Amount to charge
    pub payoff: Decimal,
}

impl CreditCard {
    /// Sum of installments not yet folded into the bill and not paid
    pub fn future_obligations(&self) -> Decimal {
        self.installments
            .iter()
            .filter(|i| i.state() == InstallmentState::Future)
            .map(|i| i.amount)
            .sum()
    }

    /// Sum still owed on installments already in the bill
    pub fn billed_outstanding(&self) -> Decimal {
        self.installments
            .iter()
            .filter(|i| i.state() == InstallmentState::InBill)
            .map(Installment::outstanding)
            .sum()
    }

    /// `limit - current_bill - future obligations`; negative when delinquent
    pub fn available_credit(&self) -> Decimal {
        self.limit - self.current_bill - self.future_obligations()
    }

    /// Obligations exceed the credit limit
    pub fn is_delinquent(&self) -> bool {
        self.current_bill + self.future_obligations() > self.limit
    }

    /// Accrue interest and fold due installments into the bill
    ///
    /// The bill cycle date only advances when at least one installment moves,
    /// so interest accrues in bursts over the whole span since the last move.
    /// Running it again on the same day with nothing newly due changes nothing.
    pub fn roll_over(&mut self, today: NaiveDate) -> RolloverOutcome {
        let mut outcome = RolloverOutcome::default();
        let days = (today - self.last_bill_cycle_date).num_days();

        if self.current_bill > Decimal::ZERO && days > 0 {
            let rate = if self.is_delinquent() {
                DELINQUENT_DAILY_RATE
            } else {
                DAILY_RATE
            };
            let interest = round_money(self.current_bill * rate * Decimal::from(days));
            self.current_bill += interest;
            outcome.interest = interest;
        }

        for installment in self.installments.iter_mut() {
            if installment.due_date <= today && !installment.paid && !installment.moved_to_bill {
                self.current_bill += installment.amount;
                installment.moved_to_bill = true;
                outcome.moved += 1;
            }
        }

        if outcome.moved > 0 {
            self.last_bill_cycle_date = today;
        }

        outcome
    }

    /// Approve a purchase and create its installment schedule
    ///
    /// Installment #1 is due today and posted to the bill immediately; the
    /// rest fall due every 30 days after it.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`, has sub-cent digits, or is too
    ///   small to give every installment at least one cent
    /// - `InvalidInstallmentCount` if `count` is outside 1..=24
    /// - `LimitExceeded` if available credit is below the pre-interest amount
    pub fn purchase(
        &mut self,
        amount: Decimal,
        count: u32,
        description: &str,
        today: NaiveDate,
    ) -> Result<PurchaseReceipt, BankError> {
        if amount <= Decimal::ZERO || !is_cent_precise(amount) {
            return Err(BankError::invalid_amount(amount, "purchase"));
        }

        if !(MIN_INSTALLMENTS..=MAX_INSTALLMENTS).contains(&count) {
            return Err(BankError::invalid_installment_count(
                count,
                MIN_INSTALLMENTS,
                MAX_INSTALLMENTS,
            ));
        }

        let available = self.available_credit();
        if available < amount {
            return Err(BankError::limit_exceeded(&self.number, available, amount));
        }

        let surcharge = installment_surcharge(count);
        let total_with_interest = amount * (Decimal::ONE + surcharge);
        let per_installment = round_money(total_with_interest / Decimal::from(count));
        if per_installment <= Decimal::ZERO {
            return Err(BankError::invalid_amount(amount, "purchase"));
        }

        for i in 0..count {
            let first = i == 0;
            self.installments.push(Installment {
                sequence: i + 1,
                count,
                amount: per_installment,
                paid_amount: Decimal::ZERO,
                due_date: today + Duration::days(INSTALLMENT_SPACING_DAYS * i64::from(i)),
                moved_to_bill: first,
                paid: false,
                purchase_amount: amount,
                description: description.to_string(),
            });
        }

        self.current_bill += per_installment;

        Ok(PurchaseReceipt {
            amount,
            count,
            surcharge,
            total_with_interest,
            per_installment,
        })
    }

    /// Check that a bill payment of `amount` is acceptable
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0` or has sub-cent digits
    /// - `AmountExceedsBill` if `amount > current_bill`
    pub fn validate_payment(&self, amount: Decimal) -> Result<(), BankError> {
        if amount <= Decimal::ZERO || !is_cent_precise(amount) {
            return Err(BankError::invalid_amount(amount, "bill payment"));
        }
        if amount > self.current_bill {
            return Err(BankError::amount_exceeds_bill(
                &self.number,
                self.current_bill,
                amount,
            ));
        }
        Ok(())
    }

    /// Apply a payment to the bill
    ///
    /// Billed installments are settled earliest due date first. A payment that
    /// cannot cover the next installment is applied partially and allocation
    /// stops. Whatever the installments do not absorb (accrued interest) is
    /// taken straight off the bill. The bill never goes below zero and
    /// residues under one cent are cleared.
    pub fn apply_payment(&mut self, amount: Decimal) -> Result<PaymentAllocation, BankError> {
        self.validate_payment(amount)?;

        let mut order: Vec<usize> = self
            .installments
            .iter()
            .enumerate()
            .filter(|(_, i)| i.state() == InstallmentState::InBill)
            .map(|(idx, _)| idx)
            .collect();
        order.sort_by_key(|&idx| self.installments[idx].due_date);

        let mut allocation = PaymentAllocation::default();
        let mut remaining = amount;

        for idx in order {
            if remaining <= Decimal::ZERO {
                break;
            }
            let installment = &mut self.installments[idx];
            let need = installment.outstanding();

            if remaining >= need {
                installment.paid_amount = installment.amount;
                installment.paid = true;
                remaining -= need;
                allocation.allocated += need;
                allocation.settled.push(installment.sequence);
            } else {
                installment.paid_amount += remaining;
                allocation.allocated += remaining;
                remaining = Decimal::ZERO;
            }
        }

        self.current_bill -= allocation.allocated;

        if remaining > Decimal::ZERO {
            let unallocated = remaining.min(self.current_bill.max(Decimal::ZERO));
            self.current_bill -= unallocated;
            allocation.unallocated = unallocated;
        }

        if self.current_bill < BILL_EPSILON {
            self.current_bill = Decimal::ZERO;
        }

        Ok(allocation)
    }

    /// Everything still owed on the card
    ///
    /// Outstanding amount of every unpaid installment (billed or future), plus
    /// the part of the bill that no billed installment accounts for.
    pub fn total_owed(&self) -> Decimal {
        let installments: Decimal = self
            .installments
            .iter()
            .filter(|i| !i.paid)
            .map(Installment::outstanding)
            .sum();
        let untracked = (self.current_bill - self.billed_outstanding()).max(Decimal::ZERO);
        installments + untracked
    }

    /// Price of settling the whole debt now
    ///
    /// # Errors
    ///
    /// `NoDebtPending` if nothing is owed.
    pub fn payoff_quote(&self) -> Result<PayoffQuote, BankError> {
        let owed = self.total_owed();
        if owed <= Decimal::ZERO {
            return Err(BankError::no_debt_pending(&self.number));
        }
        Ok(PayoffQuote {
            owed,
            payoff: round_money(owed * (Decimal::ONE - PAYOFF_DISCOUNT)),
        })
    }

    /// Mark every unpaid installment as paid and clear the bill
    pub fn settle_all(&mut self) {
        for installment in self.installments.iter_mut().filter(|i| !i.paid) {
            installment.paid_amount = installment.amount;
            installment.paid = true;
            installment.moved_to_bill = true;
        }
        self.current_bill = Decimal::ZERO;
    }

    pub fn summary(&self) -> CardSummary {
        CardSummary {
            number: self.number.clone(),
            limit: self.limit,
            current_bill: self.current_bill,
            available_credit: self.available_credit(),
            delinquent: self.is_delinquent(),
        }
    }

    /// Statement view of the card as of `today`
    ///
    /// Call after [`CreditCard::roll_over`] so the bill is current.
    pub fn statement(&self, today: NaiveDate) -> Statement {
        let line = |i: &Installment| StatementLine {
            description: i.description.clone(),
            sequence: i.sequence,
            count: i.count,
            due_date: i.due_date,
            outstanding: i.outstanding(),
        };

        let mut items: Vec<StatementLine> = self
            .installments
            .iter()
            .filter(|i| i.state() == InstallmentState::InBill)
            .map(line)
            .collect();
        items.sort_by_key(|l| l.due_date);

        let mut upcoming: Vec<StatementLine> = self
            .installments
            .iter()
            .filter(|i| i.state() == InstallmentState::Future)
            .map(line)
            .collect();
        upcoming.sort_by_key(|l| l.due_date);

        Statement {
            card: self.number.clone(),
            current_bill: self.current_bill,
            due_date: today + Duration::days(STATEMENT_DUE_DAYS),
            available_credit: self.available_credit(),
            delinquent: self.is_delinquent(),
            items,
            upcoming,
        }
    }
}
