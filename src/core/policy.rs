//! Billing and ledger policy constants
//!
//! Rates, bounds and schedules used by the billing engine and the ledger.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Smallest accepted installment count
pub const MIN_INSTALLMENTS: u32 = 1;

/// Largest accepted installment count
pub const MAX_INSTALLMENTS: u32 = 24;

/// Days between consecutive installment due dates
pub const INSTALLMENT_SPACING_DAYS: i64 = 30;

/// Daily interest on the current bill
pub const DAILY_RATE: Decimal = dec!(0.001);

/// Daily interest on the current bill while the card is delinquent
pub const DELINQUENT_DAILY_RATE: Decimal = dec!(0.003);

/// Discount granted on a full payoff
pub const PAYOFF_DISCOUNT: Decimal = dec!(0.10);

/// Bills below this residue are cleared to zero after a payment
pub const BILL_EPSILON: Decimal = dec!(0.01);

/// Statement due date, counted from the day it is produced
pub const STATEMENT_DUE_DAYS: i64 = 10;

/// Currency spent per reward point earned
pub const SPEND_PER_POINT: Decimal = dec!(10);

/// Points exchanged per redemption block
pub const POINTS_PER_REDEMPTION: u64 = 100;

/// Currency credited per redemption block
pub const REDEMPTION_VALUE: Decimal = dec!(5);

/// Maximum number of cards per account
pub const MAX_CARDS_PER_ACCOUNT: usize = 5;

/// Credit limit granted per card already held plus one
pub const CARD_LIMIT_STEP: Decimal = dec!(1000);

/// Default number of audit entries retained
pub const AUDIT_RETENTION: usize = 1000;

/// Monthly compound interest on personal loans
pub const LOAN_MONTHLY_RATE: Decimal = dec!(0.02);

/// Smallest accepted loan installment count
pub const MIN_LOAN_INSTALLMENTS: u32 = 1;

/// Largest accepted loan installment count
pub const MAX_LOAN_INSTALLMENTS: u32 = 36;

/// Loan limit as a multiple of the checking balance
pub const LOAN_LIMIT_MULTIPLIER: Decimal = dec!(5);

/// Loan limit below which no loan is granted
pub const MIN_LOAN_LIMIT: Decimal = dec!(100);

/// Days per month when valuing investments
pub const INVESTMENT_MONTH_DAYS: i64 = 30;

/// Surcharge applied to a purchase split into `count` installments
///
/// | count | surcharge |
/// |-------|-----------|
/// | 1     | 0%        |
/// | 2–3   | 2%        |
/// | 4–6   | 5%        |
/// | 7–12  | 8%        |
/// | >12   | 12%       |
pub fn installment_surcharge(count: u32) -> Decimal {
    match count {
        0 | 1 => Decimal::ZERO,
        2..=3 => dec!(0.02),
        4..=6 => dec!(0.05),
        7..=12 => dec!(0.08),
        _ => dec!(0.12),
    }
}

/// Round a money value to cents, midpoint away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Money inputs carry at most two decimal places
pub fn is_cent_precise(amount: Decimal) -> bool {
    amount == amount.round_dp(2)
}

/// Reward points earned by a purchase: one per full `SPEND_PER_POINT`
pub fn reward_points_for(amount: Decimal) -> u64 {
    use rust_decimal::prelude::ToPrimitive;

    (amount / SPEND_PER_POINT).floor().to_u64().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, dec!(0))]
    #[case(2, dec!(0.02))]
    #[case(3, dec!(0.02))]
    #[case(4, dec!(0.05))]
    #[case(6, dec!(0.05))]
    #[case(7, dec!(0.08))]
    #[case(12, dec!(0.08))]
    #[case(13, dec!(0.12))]
    #[case(24, dec!(0.12))]
    fn test_surcharge_tiers(#[case] count: u32, #[case] expected: Decimal) {
        assert_eq!(installment_surcharge(count), expected);
    }

    #[rstest]
    #[case(dec!(10.005), dec!(10.01))]
    #[case(dec!(10.004), dec!(10.00))]
    #[case(dec!(33.333333), dec!(33.33))]
    fn test_round_money(#[case] value: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_money(value), expected);
    }

    #[rstest]
    #[case(dec!(10), true)]
    #[case(dec!(10.50), true)]
    #[case(dec!(10.500), true)]
    #[case(dec!(99.995), false)]
    #[case(dec!(0.004), false)]
    fn test_cent_precision(#[case] amount: Decimal, #[case] expected: bool) {
        assert_eq!(is_cent_precise(amount), expected);
    }

    #[rstest]
    #[case(dec!(9.99), 0)]
    #[case(dec!(10), 1)]
    #[case(dec!(599.90), 59)]
    fn test_reward_points(#[case] amount: Decimal, #[case] expected: u64) {
        assert_eq!(reward_points_for(amount), expected);
    }
}
