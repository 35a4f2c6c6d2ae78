//! Bank-wide statistics for the admin report

use crate::core::policy::round_money;
use crate::types::Account;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BankStats {
    pub accounts: usize,
    pub total_balance: Decimal,
    /// Zero when there are no accounts
    pub average_balance: Decimal,
    pub total_points: u64,
    /// History entries across every account
    pub total_transactions: usize,
    /// First account by username among those with the highest balance
    pub largest_balance: Option<(String, Decimal)>,
    /// First account by username among those with the longest history
    pub most_active: Option<(String, usize)>,
    /// Outstanding amount of every active loan
    pub loan_debt: Decimal,
    /// Current value of every open investment
    pub invested: Decimal,
}

impl BankStats {
    /// Aggregate `accounts`, valuing investments at `now`
    pub fn from_accounts(accounts: &[Account], now: DateTime<Utc>) -> Self {
        let mut stats = BankStats {
            accounts: accounts.len(),
            ..BankStats::default()
        };

        for account in accounts {
            stats.total_balance += account.balance;
            stats.total_points = stats.total_points.saturating_add(account.reward_points);
            stats.total_transactions += account.history.len();
            stats.loan_debt += account.loan_debt();
            stats.invested += account
                .portfolio(now)
                .iter()
                .map(|h| h.value)
                .sum::<Decimal>();

            if stats
                .largest_balance
                .as_ref()
                .map_or(true, |(_, best)| account.balance > *best)
            {
                stats.largest_balance = Some((account.username.clone(), account.balance));
            }
            if stats
                .most_active
                .as_ref()
                .map_or(true, |(_, best)| account.history.len() > *best)
            {
                stats.most_active = Some((account.username.clone(), account.history.len()));
            }
        }

        if !accounts.is_empty() {
            stats.average_balance = round_money(stats.total_balance / Decimal::from(accounts.len()));
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InvestmentKind;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 14, 30, 0).unwrap()
    }

    fn account(name: &str, deposits: &[Decimal]) -> Account {
        let mut account = Account::new(name, at());
        for amount in deposits {
            account.credit(*amount, "DEPOSIT", at()).unwrap();
        }
        account
    }

    #[test]
    fn test_empty_bank() {
        let stats = BankStats::from_accounts(&[], at());

        assert_eq!(stats.accounts, 0);
        assert_eq!(stats.average_balance, Decimal::ZERO);
        assert_eq!(stats.largest_balance, None);
        assert_eq!(stats.most_active, None);
    }

    #[test]
    fn test_aggregates_balances_points_and_activity() {
        let mut ana = account("ana", &[dec!(100), dec!(50)]);
        ana.award_points(30);
        let bob = account("bob", &[dec!(200)]);
        let carol = account("carol", &[dec!(25), dec!(25)]);

        let stats = BankStats::from_accounts(&[ana, bob, carol], at());

        assert_eq!(stats.accounts, 3);
        assert_eq!(stats.total_balance, dec!(400));
        assert_eq!(stats.average_balance, dec!(133.33));
        assert_eq!(stats.total_points, 30);
        assert_eq!(stats.total_transactions, 5);
        assert_eq!(stats.largest_balance, Some(("bob".to_string(), dec!(200))));
        // ana and carol tie; the first one wins
        assert_eq!(stats.most_active, Some(("ana".to_string(), 2)));
    }

    #[test]
    fn test_includes_loans_and_investments() {
        let mut ana = account("ana", &[dec!(500)]);
        ana.take_loan(dec!(100), 1, at()).unwrap();
        ana.invest(InvestmentKind::Cdb, dec!(200), at()).unwrap();

        let stats = BankStats::from_accounts(&[ana], at());

        assert_eq!(stats.loan_debt, dec!(102.00));
        assert_eq!(stats.invested, dec!(200.00));
        assert_eq!(stats.total_balance, dec!(400));
    }
}
