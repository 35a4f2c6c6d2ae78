//! Account ledger
//!
//! This module provides balance operations on [`Account`] and the
//! `AccountLedger` service that runs them against a repository.
//!
//! The ledger is responsible for:
//! - Opening accounts at sign-up
//! - Crediting and debiting balances with insufficient-funds checks
//! - Appending every movement to the account's transaction history
//! - Atomic transfers between two accounts
//! - Awarding and redeeming reward points

use crate::core::policy::{is_cent_precise, POINTS_PER_REDEMPTION, REDEMPTION_VALUE};
use crate::core::traits::Repository;
use crate::types::{Account, BankError, TransactionEntry};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

impl Account {
    /// Add funds and record the movement
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if `amount <= 0` or has sub-cent digits.
    pub fn credit(
        &mut self,
        amount: Decimal,
        description: &str,
        at: DateTime<Utc>,
    ) -> Result<(), BankError> {
        if amount <= Decimal::ZERO || !is_cent_precise(amount) {
            return Err(BankError::invalid_amount(amount, "credit"));
        }

        self.balance += amount;
        self.history.push(TransactionEntry {
            timestamp: at,
            description: description.to_string(),
            amount,
        });

        Ok(())
    }

    /// Remove funds and record the movement
    ///
    /// There are no partial debits: either the whole amount is taken or the
    /// account is left untouched.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0` or has sub-cent digits
    /// - `InsufficientFunds` if `amount` exceeds the balance
    pub fn debit(
        &mut self,
        amount: Decimal,
        description: &str,
        at: DateTime<Utc>,
    ) -> Result<(), BankError> {
        if amount <= Decimal::ZERO || !is_cent_precise(amount) {
            return Err(BankError::invalid_amount(amount, "debit"));
        }

        if self.balance < amount {
            return Err(BankError::insufficient_funds(
                &self.username,
                self.balance,
                amount,
            ));
        }

        self.balance -= amount;
        self.history.push(TransactionEntry {
            timestamp: at,
            description: description.to_string(),
            amount: -amount,
        });

        Ok(())
    }

    pub fn award_points(&mut self, points: u64) {
        self.reward_points = self.reward_points.saturating_add(points);
    }

    /// Exchange reward points for balance
    ///
    /// Points are redeemed in blocks of 100, each worth R$ 5.00.
    /// Returns the credited amount.
    ///
    /// # Errors
    ///
    /// - `InvalidRedemption` if `points` is zero or not a multiple of 100
    /// - `InsufficientPoints` if the account holds fewer points
    pub fn redeem_points(&mut self, points: u64, at: DateTime<Utc>) -> Result<Decimal, BankError> {
        if points == 0 || points % POINTS_PER_REDEMPTION != 0 {
            return Err(BankError::invalid_redemption(
                points,
                "points must be redeemed in positive multiples of 100",
            ));
        }

        if points > self.reward_points {
            return Err(BankError::insufficient_points(
                &self.username,
                self.reward_points,
                points,
            ));
        }

        let value = Decimal::from(points / POINTS_PER_REDEMPTION) * REDEMPTION_VALUE;
        self.credit(value, &format!("POINTS REDEMPTION ({points} pts)"), at)?;
        self.reward_points -= points;

        Ok(value)
    }
}

/// Ledger service over an account repository
///
/// Every public operation is one read-modify-write cycle: load the full
/// record, mutate it in memory, save the full record back.
pub struct AccountLedger<R: Repository<Account>> {
    accounts: R,
}

impl<R: Repository<Account>> AccountLedger<R> {
    pub fn new(accounts: R) -> Self {
        AccountLedger { accounts }
    }

    /// Open a new account with zero balance
    ///
    /// # Errors
    ///
    /// - `InvalidUsername` if the username is blank
    /// - `AccountAlreadyExists` if the username is taken
    pub fn open_account(&mut self, username: &str, at: DateTime<Utc>) -> Result<Account, BankError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(BankError::InvalidUsername {
                username: username.to_string(),
            });
        }

        if self.accounts.load(username)?.is_some() {
            return Err(BankError::account_already_exists(username));
        }

        let mut account = Account::new(username, at);
        self.accounts.save(username, &mut account)?;
        Ok(account)
    }

    /// Load an account
    ///
    /// # Errors
    ///
    /// `AccountNotFound` if the username is unknown.
    pub fn get(&self, username: &str) -> Result<Account, BankError> {
        self.accounts
            .load(username)?
            .ok_or_else(|| BankError::account_not_found(username))
    }

    /// All accounts, sorted by username
    pub fn all(&self) -> Result<Vec<Account>, BankError> {
        let mut accounts = self.accounts.load_all()?;
        accounts.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(accounts)
    }

    /// Persist an account mutated by the caller
    pub fn commit(&mut self, account: &mut Account) -> Result<(), BankError> {
        let key = account.username.clone();
        self.accounts.save(&key, account)?;
        Ok(())
    }

    /// Fail early if an account was changed since it was loaded
    pub fn check_version(&self, account: &Account) -> Result<(), BankError> {
        self.accounts.check_version(&account.username, account)?;
        Ok(())
    }

    pub fn deposit(
        &mut self,
        username: &str,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<Account, BankError> {
        let mut account = self.get(username)?;
        account.credit(amount, "DEPOSIT", at)?;
        self.commit(&mut account)?;
        Ok(account)
    }

    pub fn withdraw(
        &mut self,
        username: &str,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<Account, BankError> {
        let mut account = self.get(username)?;
        account.debit(amount, "WITHDRAWAL", at)?;
        self.commit(&mut account)?;
        Ok(account)
    }

    /// Move funds between two accounts
    ///
    /// Both sides are validated and version-checked before either is written,
    /// so a rejected transfer leaves both accounts unchanged. The two saves
    /// are still separate writes: if the receiver's save fails after the
    /// sender's succeeded, the sender's debit stays on disk.
    ///
    /// # Errors
    ///
    /// - `InvalidTransfer` if sender and receiver are the same
    /// - `AccountNotFound` if either side is unknown
    /// - `InvalidAmount` / `InsufficientFunds` from the debit
    pub fn transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<(Account, Account), BankError> {
        if from == to {
            return Err(BankError::InvalidTransfer {
                account: from.to_string(),
            });
        }

        let mut sender = self.get(from)?;
        let mut receiver = self.get(to)?;

        sender.debit(amount, &format!("TRANSFER SENT to {to}"), at)?;
        receiver.credit(amount, &format!("TRANSFER RECEIVED from {from}"), at)?;

        self.check_version(&sender)?;
        self.check_version(&receiver)?;
        self.commit(&mut sender)?;
        self.commit(&mut receiver)?;

        Ok((sender, receiver))
    }

    /// Load an account, apply `change` and persist the result
    ///
    /// Nothing is written when `change` fails.
    pub fn update<T>(
        &mut self,
        username: &str,
        change: impl FnOnce(&mut Account) -> Result<T, BankError>,
    ) -> Result<(Account, T), BankError> {
        let mut account = self.get(username)?;
        let outcome = change(&mut account)?;
        self.commit(&mut account)?;
        Ok((account, outcome))
    }

    /// Transaction history, oldest first
    pub fn history(&self, username: &str) -> Result<Vec<TransactionEntry>, BankError> {
        Ok(self.get(username)?.history)
    }

    /// Exchange points for balance, returning the credited amount
    pub fn redeem_points(
        &mut self,
        username: &str,
        points: u64,
        at: DateTime<Utc>,
    ) -> Result<Decimal, BankError> {
        let mut account = self.get(username)?;
        let value = account.redeem_points(points, at)?;
        self.commit(&mut account)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::InMemoryStore;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 14, 30, 0).unwrap()
    }

    fn ledger_with(accounts: &[(&str, Decimal)]) -> AccountLedger<InMemoryStore<Account>> {
        let mut ledger = AccountLedger::new(InMemoryStore::new());
        for (name, balance) in accounts {
            ledger.open_account(name, at()).unwrap();
            if *balance > Decimal::ZERO {
                ledger.deposit(name, *balance, at()).unwrap();
            }
        }
        ledger
    }

    #[test]
    fn test_open_account_starts_empty() {
        let ledger = ledger_with(&[("ana", Decimal::ZERO)]);

        let account = ledger.get("ana").unwrap();
        assert_eq!(account.balance, Decimal::ZERO);
        assert_eq!(account.reward_points, 0);
        assert!(account.history.is_empty());
        assert_eq!(account.version, 1);
    }

    #[test]
    fn test_open_account_rejects_duplicates_and_blanks() {
        let mut ledger = ledger_with(&[("ana", Decimal::ZERO)]);

        assert!(matches!(
            ledger.open_account("ana", at()),
            Err(BankError::AccountAlreadyExists { .. })
        ));
        assert!(matches!(
            ledger.open_account("   ", at()),
            Err(BankError::InvalidUsername { .. })
        ));
    }

    #[test]
    fn test_deposit_appends_history() {
        let mut ledger = ledger_with(&[("ana", Decimal::ZERO)]);

        let account = ledger.deposit("ana", dec!(150.25), at()).unwrap();

        assert_eq!(account.balance, dec!(150.25));
        assert_eq!(account.history.len(), 1);
        assert_eq!(account.history[0].description, "DEPOSIT");
        assert_eq!(account.history[0].amount, dec!(150.25));
    }

    #[test]
    fn test_withdraw_with_insufficient_funds_changes_nothing() {
        let mut ledger = ledger_with(&[("ana", dec!(100))]);

        let result = ledger.withdraw("ana", dec!(100.01), at());

        assert!(matches!(result, Err(BankError::InsufficientFunds { .. })));
        let account = ledger.get("ana").unwrap();
        assert_eq!(account.balance, dec!(100));
        assert_eq!(account.history.len(), 1);
    }

    #[test]
    fn test_credit_and_debit_reject_non_positive_amounts() {
        let mut account = Account::new("ana", at());

        assert!(matches!(
            account.credit(Decimal::ZERO, "DEPOSIT", at()),
            Err(BankError::InvalidAmount { .. })
        ));
        assert!(matches!(
            account.debit(dec!(-1), "WITHDRAWAL", at()),
            Err(BankError::InvalidAmount { .. })
        ));
        assert!(account.history.is_empty());
    }

    #[rstest]
    #[case::three_decimals(dec!(1.001))]
    #[case::half_cent(dec!(99.995))]
    fn test_credit_and_debit_reject_sub_cent_amounts(#[case] amount: Decimal) {
        let mut account = Account::new("ana", at());
        account.balance = dec!(500);

        assert!(matches!(
            account.credit(amount, "DEPOSIT", at()),
            Err(BankError::InvalidAmount { .. })
        ));
        assert!(matches!(
            account.debit(amount, "WITHDRAWAL", at()),
            Err(BankError::InvalidAmount { .. })
        ));
        assert_eq!(account.balance, dec!(500));
        assert!(account.history.is_empty());
    }

    #[test]
    fn test_transfer_moves_funds_between_accounts() {
        let mut ledger = ledger_with(&[("ana", dec!(200)), ("bob", Decimal::ZERO)]);

        ledger.transfer("ana", "bob", dec!(75), at()).unwrap();

        assert_eq!(ledger.get("ana").unwrap().balance, dec!(125));
        assert_eq!(ledger.get("bob").unwrap().balance, dec!(75));
        assert_eq!(
            ledger.history("bob").unwrap()[0].description,
            "TRANSFER RECEIVED from ana"
        );
    }

    #[test]
    fn test_transfer_is_atomic_on_failure() {
        let mut ledger = ledger_with(&[("ana", dec!(50)), ("bob", dec!(10))]);

        let result = ledger.transfer("ana", "bob", dec!(80), at());
        assert!(matches!(result, Err(BankError::InsufficientFunds { .. })));

        let result = ledger.transfer("ana", "nobody", dec!(10), at());
        assert!(matches!(result, Err(BankError::AccountNotFound { .. })));

        let result = ledger.transfer("ana", "ana", dec!(10), at());
        assert!(matches!(result, Err(BankError::InvalidTransfer { .. })));

        assert_eq!(ledger.get("ana").unwrap().balance, dec!(50));
        assert_eq!(ledger.get("bob").unwrap().balance, dec!(10));
    }

    #[test]
    fn test_redeem_points() {
        let mut ledger = ledger_with(&[("ana", Decimal::ZERO)]);
        let mut account = ledger.get("ana").unwrap();
        account.award_points(250);
        ledger.commit(&mut account).unwrap();

        assert!(matches!(
            ledger.redeem_points("ana", 150, at()),
            Err(BankError::InvalidRedemption { .. })
        ));
        assert!(matches!(
            ledger.redeem_points("ana", 300, at()),
            Err(BankError::InsufficientPoints { .. })
        ));

        let value = ledger.redeem_points("ana", 200, at()).unwrap();

        assert_eq!(value, dec!(10));
        let account = ledger.get("ana").unwrap();
        assert_eq!(account.balance, dec!(10));
        assert_eq!(account.reward_points, 50);
    }

    #[test]
    fn test_update_persists_only_on_success() {
        let mut ledger = ledger_with(&[("ana", dec!(100))]);

        let result = ledger.update("ana", |account| account.debit(dec!(500), "WITHDRAWAL", at()));
        assert!(matches!(result, Err(BankError::InsufficientFunds { .. })));
        assert_eq!(ledger.get("ana").unwrap().version, 2);

        let (account, ()) = ledger
            .update("ana", |account| account.debit(dec!(40), "WITHDRAWAL", at()))
            .unwrap();
        assert_eq!(account.balance, dec!(60));
        assert_eq!(ledger.get("ana").unwrap().version, 3);
    }

    #[test]
    fn test_history_is_oldest_first() {
        let mut ledger = ledger_with(&[("ana", dec!(100))]);
        ledger.withdraw("ana", dec!(30), at()).unwrap();
        ledger.deposit("ana", dec!(5), at()).unwrap();

        let amounts: Vec<Decimal> = ledger
            .history("ana")
            .unwrap()
            .iter()
            .map(|e| e.amount)
            .collect();

        assert_eq!(amounts, vec![dec!(100), dec!(-30), dec!(5)]);
    }

    proptest! {
        #[test]
        fn prop_credit_then_debit_round_trips(
            start_cents in 0i64..10_000_000,
            amount_cents in 1i64..10_000_000,
        ) {
            let mut account = Account::new("ana", at());
            account.balance = Decimal::new(start_cents, 2);
            let amount = Decimal::new(amount_cents, 2);

            account.credit(amount, "DEPOSIT", at()).unwrap();
            account.debit(amount, "WITHDRAWAL", at()).unwrap();

            prop_assert!((account.balance - Decimal::new(start_cents, 2)).abs() < dec!(0.01));
            prop_assert_eq!(account.history.len(), 2);
        }
    }
}
