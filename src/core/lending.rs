//! Personal loans
//!
//! Loan operations on [`Account`]. A loan credits its principal to the
//! balance at once and is repaid in equal monthly installments. The total
//! repaid is the principal compounded at 2% for every month of the plan.
//!
//! The amount a customer may borrow is five times the current balance, and
//! no loan is granted while that limit is under 100.

use crate::core::policy::{
    is_cent_precise, round_money, LOAN_LIMIT_MULTIPLIER, LOAN_MONTHLY_RATE,
    MAX_LOAN_INSTALLMENTS, MIN_LOAN_INSTALLMENTS, MIN_LOAN_LIMIT,
};
use crate::types::{Account, BankError, Loan, LoanId, LoanStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Result of a loan repayment
#[derive(Debug, Clone, PartialEq)]
pub struct LoanPayment {
    pub loan: LoanId,
    /// Amount debited from the balance
    pub amount: Decimal,
    /// Amount still owed after the payment
    pub outstanding: Decimal,
    pub paid_off: bool,
}

/// Principal plus compound interest over `months`, rounded to cents
pub fn loan_total(principal: Decimal, months: u32) -> Decimal {
    let growth = Decimal::ONE + LOAN_MONTHLY_RATE;
    let factor = (0..months).fold(Decimal::ONE, |acc, _| acc * growth);
    round_money(principal * factor)
}

impl Account {
    /// Largest principal this account may borrow right now
    pub fn loan_limit(&self) -> Decimal {
        self.balance * LOAN_LIMIT_MULTIPLIER
    }

    pub fn active_loans(&self) -> impl Iterator<Item = &Loan> {
        self.loans.iter().filter(|l| l.is_active())
    }

    /// Sum still owed across active loans
    pub fn loan_debt(&self) -> Decimal {
        self.active_loans().map(|l| l.outstanding).sum()
    }

    /// Take a loan and credit its principal to the balance
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`, has sub-cent digits, or is too
    ///   small to give every installment at least one cent
    /// - `InvalidInstallmentCount` if `installments` is outside 1..=36
    /// - `LoanNotEligible` if the loan limit is below 100
    /// - `LoanLimitExceeded` if `amount` is above the loan limit
    pub fn take_loan(
        &mut self,
        amount: Decimal,
        installments: u32,
        at: DateTime<Utc>,
    ) -> Result<Loan, BankError> {
        if amount <= Decimal::ZERO || !is_cent_precise(amount) {
            return Err(BankError::invalid_amount(amount, "loan"));
        }

        if !(MIN_LOAN_INSTALLMENTS..=MAX_LOAN_INSTALLMENTS).contains(&installments) {
            return Err(BankError::invalid_installment_count(
                installments,
                MIN_LOAN_INSTALLMENTS,
                MAX_LOAN_INSTALLMENTS,
            ));
        }

        let limit = self.loan_limit();
        if limit < MIN_LOAN_LIMIT {
            return Err(BankError::LoanNotEligible {
                account: self.username.clone(),
                limit,
                minimum: MIN_LOAN_LIMIT,
            });
        }
        if amount > limit {
            return Err(BankError::LoanLimitExceeded {
                account: self.username.clone(),
                limit,
                requested: amount,
            });
        }

        let total = loan_total(amount, installments);
        let installment_amount = round_money(total / Decimal::from(installments));
        if installment_amount <= Decimal::ZERO {
            return Err(BankError::invalid_amount(amount, "loan"));
        }

        let id = self.loans.iter().map(|l| l.id).max().unwrap_or(0) + 1;
        self.credit(amount, &format!("LOAN #{id} ({installments}x)"), at)?;

        let loan = Loan {
            id,
            principal: amount,
            total,
            outstanding: total,
            installments,
            installments_paid: 0,
            installment_amount,
            taken_at: at,
            status: LoanStatus::Active,
        };
        self.loans.push(loan.clone());

        Ok(loan)
    }

    fn active_loan_index(&self, id: LoanId) -> Result<usize, BankError> {
        self.loans
            .iter()
            .position(|l| l.id == id && l.is_active())
            .ok_or_else(|| BankError::loan_not_found(&self.username, id))
    }

    /// Pay the next installment of a loan
    ///
    /// The last installment charges whatever is left, so rounding never
    /// leaves a residue on a finished plan.
    ///
    /// # Errors
    ///
    /// - `LoanNotFound` if no active loan has this id
    /// - `InsufficientFunds` if the balance cannot cover the installment
    pub fn pay_loan_installment(
        &mut self,
        id: LoanId,
        at: DateTime<Utc>,
    ) -> Result<LoanPayment, BankError> {
        let idx = self.active_loan_index(id)?;
        let loan = &self.loans[idx];
        let amount = if loan.installments_left() <= 1 {
            loan.outstanding
        } else {
            loan.installment_amount.min(loan.outstanding)
        };

        self.debit(amount, &format!("LOAN #{id} INSTALLMENT"), at)?;

        let loan = &mut self.loans[idx];
        loan.outstanding -= amount;
        loan.installments_paid += 1;
        if loan.installments_paid >= loan.installments || loan.outstanding <= Decimal::ZERO {
            loan.outstanding = Decimal::ZERO;
            loan.status = LoanStatus::PaidOff;
        }

        Ok(LoanPayment {
            loan: id,
            amount,
            outstanding: loan.outstanding,
            paid_off: !loan.is_active(),
        })
    }

    /// Repay everything still owed on a loan
    ///
    /// # Errors
    ///
    /// - `LoanNotFound` if no active loan has this id
    /// - `InsufficientFunds` if the balance cannot cover the outstanding amount
    pub fn pay_off_loan(&mut self, id: LoanId, at: DateTime<Utc>) -> Result<LoanPayment, BankError> {
        let idx = self.active_loan_index(id)?;
        let amount = self.loans[idx].outstanding;

        self.debit(amount, &format!("LOAN #{id} PAYOFF"), at)?;

        let loan = &mut self.loans[idx];
        loan.outstanding = Decimal::ZERO;
        loan.installments_paid = loan.installments;
        loan.status = LoanStatus::PaidOff;

        Ok(LoanPayment {
            loan: id,
            amount,
            outstanding: Decimal::ZERO,
            paid_off: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 14, 30, 0).unwrap()
    }

    fn account(balance: Decimal) -> Account {
        let mut account = Account::new("ana", at());
        account.balance = balance;
        account
    }

    #[rstest]
    #[case(dec!(1000), 1, dec!(1020.00))]
    #[case(dec!(1000), 12, dec!(1268.24))]
    #[case(dec!(100), 3, dec!(106.12))]
    fn test_loan_total_compounds_monthly(
        #[case] principal: Decimal,
        #[case] months: u32,
        #[case] expected: Decimal,
    ) {
        assert_eq!(loan_total(principal, months), expected);
    }

    #[test]
    fn test_take_loan_credits_principal() {
        let mut account = account(dec!(500));

        let loan = account.take_loan(dec!(1000), 12, at()).unwrap();

        assert_eq!(loan.id, 1);
        assert_eq!(loan.total, dec!(1268.24));
        assert_eq!(loan.installment_amount, dec!(105.69));
        assert_eq!(loan.outstanding, dec!(1268.24));
        assert_eq!(account.balance, dec!(1500));
        assert_eq!(account.loan_debt(), dec!(1268.24));
        assert_eq!(account.history[0].description, "LOAN #1 (12x)");
    }

    #[rstest]
    #[case::below_minimum_limit(dec!(19.99), dec!(50), 6)]
    #[case::above_limit(dec!(100), dec!(500.01), 6)]
    #[case::too_many_installments(dec!(100), dec!(100), 37)]
    #[case::sub_cent(dec!(100), dec!(10.005), 6)]
    #[case::installment_rounds_to_zero(dec!(100), dec!(0.01), 36)]
    fn test_take_loan_rejections_change_nothing(
        #[case] balance: Decimal,
        #[case] amount: Decimal,
        #[case] installments: u32,
    ) {
        let mut account = account(balance);
        let before = account.clone();

        assert!(account.take_loan(amount, installments, at()).is_err());
        assert_eq!(account, before);
    }

    #[test]
    fn test_loan_eligibility_errors() {
        assert!(matches!(
            account(dec!(19.99)).take_loan(dec!(50), 6, at()),
            Err(BankError::LoanNotEligible { .. })
        ));
        assert!(matches!(
            account(dec!(100)).take_loan(dec!(500.01), 6, at()),
            Err(BankError::LoanLimitExceeded { .. })
        ));
        assert!(account(dec!(20)).take_loan(dec!(100), 6, at()).is_ok());
    }

    #[test]
    fn test_last_installment_clears_rounding_residue() {
        let mut account = account(dec!(200));
        account.take_loan(dec!(100), 3, at()).unwrap();

        let first = account.pay_loan_installment(1, at()).unwrap();
        let second = account.pay_loan_installment(1, at()).unwrap();
        let last = account.pay_loan_installment(1, at()).unwrap();

        assert_eq!(first.amount, dec!(35.37));
        assert_eq!(second.amount, dec!(35.37));
        assert_eq!(last.amount, dec!(35.38));
        assert!(last.paid_off);
        assert_eq!(account.loan_debt(), Decimal::ZERO);
        assert_eq!(account.balance, dec!(300) - dec!(106.12));
        assert!(matches!(
            account.pay_loan_installment(1, at()),
            Err(BankError::LoanNotFound { loan: 1, .. })
        ));
    }

    #[test]
    fn test_pay_off_loan() {
        let mut account = account(dec!(500));
        account.take_loan(dec!(1000), 12, at()).unwrap();
        account.pay_loan_installment(1, at()).unwrap();

        let payment = account.pay_off_loan(1, at()).unwrap();

        assert_eq!(payment.amount, dec!(1162.55));
        assert!(payment.paid_off);
        assert_eq!(account.balance, dec!(231.76));
        assert_eq!(account.loans[0].status, LoanStatus::PaidOff);
        assert_eq!(account.active_loans().count(), 0);
    }

    #[test]
    fn test_loan_payment_requires_funds() {
        let mut account = account(dec!(100));
        account.take_loan(dec!(300), 2, at()).unwrap();
        account.balance = dec!(10);
        let before = account.clone();

        assert!(matches!(
            account.pay_loan_installment(1, at()),
            Err(BankError::InsufficientFunds { .. })
        ));
        assert!(matches!(
            account.pay_off_loan(1, at()),
            Err(BankError::InsufficientFunds { .. })
        ));
        assert_eq!(account, before);
    }

    #[test]
    fn test_loan_ids_are_sequential() {
        let mut account = account(dec!(1000));

        let first = account.take_loan(dec!(100), 1, at()).unwrap();
        let second = account.take_loan(dec!(100), 1, at()).unwrap();

        assert_eq!((first.id, second.id), (1, 2));
    }
}
