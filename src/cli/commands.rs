//! Sub-command dispatch
//!
//! Runs one parsed [`Command`] against a bank and renders the result to a
//! writer. Kept separate from `main` so it can be exercised in tests.

use super::args::{CardCommand, Command, InvestCommand, LoanCommand};
use crate::core::traits::{AuditStore, Repository};
use crate::core::{Bank, Clock};
use crate::io::{write_accounts_csv, write_history_csv};
use crate::core::BankStats;
use crate::types::{Account, BankError, CreditCard, InvestmentKind, Statement};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

/// Errors a CLI invocation can end with
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Bank(#[from] BankError),

    #[error("Output error: {0}")]
    Output(String),
}

impl From<io::Error> for CliError {
    fn from(error: io::Error) -> Self {
        CliError::Output(error.to_string())
    }
}

/// Execute one command
///
/// # Arguments
///
/// * `bank` - The bank to operate on
/// * `command` - Parsed sub-command
/// * `out` - Where human-readable output and CSV go
///
/// # Errors
///
/// Any `BankError` from the operation, or an output error.
pub fn execute<A, K, L, C>(
    bank: &mut Bank<A, K, L, C>,
    command: Command,
    out: &mut dyn Write,
) -> Result<(), CliError>
where
    A: Repository<Account>,
    K: Repository<CreditCard>,
    L: AuditStore,
    C: Clock,
{
    match command {
        Command::Open { username } => {
            let account = bank.open_account(&username)?;
            writeln!(out, "Account {} opened", account.username)?;
        }
        Command::Deposit { username, amount } => {
            let account = bank.deposit(&username, amount)?;
            writeln!(out, "Balance: {:.2}", account.balance)?;
        }
        Command::Withdraw { username, amount } => {
            let account = bank.withdraw(&username, amount)?;
            writeln!(out, "Balance: {:.2}", account.balance)?;
        }
        Command::Transfer { from, to, amount } => {
            let sender = bank.transfer(&from, &to, amount)?;
            writeln!(out, "Transferred {amount:.2} to {to}")?;
            writeln!(out, "Balance: {:.2}", sender.balance)?;
        }
        Command::Balance { username } => {
            let account = bank.account(&username)?;
            writeln!(out, "Balance: {:.2}", account.balance)?;
            writeln!(out, "Reward points: {}", account.reward_points)?;
        }
        Command::History { username, limit } => {
            let history = bank.history(&username)?;
            let skip = limit.map_or(0, |n| history.len().saturating_sub(n));
            for entry in history.iter().skip(skip) {
                writeln!(
                    out,
                    "{}  {:<40} {:>12.2}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.description,
                    entry.amount
                )?;
            }
        }
        Command::Redeem { username, points } => {
            let value = bank.redeem_points(&username, points)?;
            writeln!(out, "Redeemed {points} points for {value:.2}")?;
        }
        Command::Card { command } => execute_card(bank, command, out)?,
        Command::Loan { command } => execute_loan(bank, command, out)?,
        Command::Invest { command } => execute_invest(bank, command, out)?,
        Command::Stats => render_stats(&bank.stats()?, out)?,
        Command::Audit { account, limit } => {
            for entry in bank.audit_entries(account.as_deref(), limit) {
                writeln!(
                    out,
                    "{}  {:<12} {:<16} {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.account,
                    entry.action,
                    entry.details
                )?;
            }
        }
        Command::ExportHistory { username, output } => {
            let history = bank.history(&username)?;
            with_output(output.as_deref(), out, |w| write_history_csv(&history, w))?;
        }
        Command::ExportAccounts { output } => {
            let accounts = bank.accounts()?;
            with_output(output.as_deref(), out, |w| write_accounts_csv(&accounts, w))?;
        }
    }

    Ok(())
}

fn execute_card<A, K, L, C>(
    bank: &mut Bank<A, K, L, C>,
    command: CardCommand,
    out: &mut dyn Write,
) -> Result<(), CliError>
where
    A: Repository<Account>,
    K: Repository<CreditCard>,
    L: AuditStore,
    C: Clock,
{
    match command {
        CardCommand::Issue { username } => {
            let card = bank.issue_card(&username)?;
            writeln!(out, "Card {} issued, limit {:.2}", card.number, card.limit)?;
        }
        CardCommand::List { username } => {
            for card in bank.cards_of(&username)? {
                writeln!(
                    out,
                    "{}  limit {:.2}  bill {:.2}  available {:.2}{}",
                    card.number,
                    card.limit,
                    card.current_bill,
                    card.available_credit,
                    if card.delinquent { "  DELINQUENT" } else { "" }
                )?;
            }
        }
        CardCommand::Purchase {
            username,
            amount,
            installments,
            description,
            card,
        } => {
            let number = resolve_card(bank, &username, card)?;
            let receipt =
                bank.make_purchase(&username, &number, amount, installments, &description)?;
            writeln!(
                out,
                "Approved on card {number}: {}x {:.2} (total {:.2})",
                receipt.count, receipt.per_installment, receipt.total_with_interest
            )?;
        }
        CardCommand::Statement { username, card } => {
            let number = resolve_card(bank, &username, card)?;
            let statement = bank.statement(&username, &number)?;
            render_statement(&statement, out)?;
        }
        CardCommand::Pay {
            username,
            amount,
            card,
        } => {
            let number = resolve_card(bank, &username, card)?;
            let allocation = bank.pay_bill(&username, &number, amount)?;
            writeln!(
                out,
                "Paid {amount:.2} on card {number}, {} installment(s) settled",
                allocation.settled.len()
            )?;
        }
        CardCommand::Payoff { username, card } => {
            let number = resolve_card(bank, &username, card)?;
            let quote = bank.quit_total_debt(&username, &number)?;
            writeln!(
                out,
                "Settled {:.2} of debt on card {number} for {:.2}",
                quote.owed, quote.payoff
            )?;
        }
    }

    Ok(())
}

fn execute_loan<A, K, L, C>(
    bank: &mut Bank<A, K, L, C>,
    command: LoanCommand,
    out: &mut dyn Write,
) -> Result<(), CliError>
where
    A: Repository<Account>,
    K: Repository<CreditCard>,
    L: AuditStore,
    C: Clock,
{
    match command {
        LoanCommand::Take {
            username,
            amount,
            installments,
        } => {
            let loan = bank.take_loan(&username, amount, installments)?;
            writeln!(
                out,
                "Loan #{} approved: {}x {:.2} (total {:.2})",
                loan.id, loan.installments, loan.installment_amount, loan.total
            )?;
        }
        LoanCommand::List { username } => {
            let loans = bank.loans(&username)?;
            for loan in &loans {
                writeln!(
                    out,
                    "#{}  taken {}  principal {:.2}  owed {:.2}  {} x {:.2} left",
                    loan.id,
                    loan.taken_at.format("%Y-%m-%d"),
                    loan.principal,
                    loan.outstanding,
                    loan.installments_left(),
                    loan.installment_amount
                )?;
            }
            let owed: Decimal = loans.iter().map(|l| l.outstanding).sum();
            writeln!(out, "Total owed: {owed:.2}")?;
        }
        LoanCommand::Pay { username, loan } => {
            let payment = bank.pay_loan_installment(&username, loan)?;
            writeln!(
                out,
                "Paid {:.2} on loan #{loan}, {:.2} left{}",
                payment.amount,
                payment.outstanding,
                if payment.paid_off { ", loan repaid" } else { "" }
            )?;
        }
        LoanCommand::Payoff { username, loan } => {
            let payment = bank.pay_off_loan(&username, loan)?;
            writeln!(out, "Loan #{loan} repaid with {:.2}", payment.amount)?;
        }
    }

    Ok(())
}

fn execute_invest<A, K, L, C>(
    bank: &mut Bank<A, K, L, C>,
    command: InvestCommand,
    out: &mut dyn Write,
) -> Result<(), CliError>
where
    A: Repository<Account>,
    K: Repository<CreditCard>,
    L: AuditStore,
    C: Clock,
{
    match command {
        InvestCommand::Options => {
            for kind in InvestmentKind::ALL {
                writeln!(
                    out,
                    "{:<10} {:>5.1}% a year  risk: {}",
                    kind,
                    kind.monthly_rate() * Decimal::from(1200),
                    kind.risk()
                )?;
            }
        }
        InvestCommand::New {
            username,
            kind,
            amount,
        } => {
            let investment = bank.invest(&username, kind, amount)?;
            writeln!(out, "Investment #{} of {amount:.2} in {kind}", investment.id)?;
        }
        InvestCommand::List { username } => {
            let portfolio = bank.portfolio(&username)?;
            for holding in &portfolio {
                writeln!(
                    out,
                    "#{}  {:<10} since {}  invested {:.2}  value {:.2}  earned {:.2}",
                    holding.investment.id,
                    holding.investment.kind,
                    holding.investment.opened_at.format("%Y-%m-%d"),
                    holding.investment.principal,
                    holding.value,
                    holding.earnings
                )?;
            }
            let invested: Decimal = portfolio.iter().map(|h| h.investment.principal).sum();
            let value: Decimal = portfolio.iter().map(|h| h.value).sum();
            writeln!(
                out,
                "Invested: {invested:.2}  value: {value:.2}  earned: {:.2}",
                value - invested
            )?;
        }
        InvestCommand::Redeem {
            username,
            investment,
        } => {
            let holding = bank.redeem_investment(&username, investment)?;
            writeln!(
                out,
                "Redeemed #{investment} for {:.2} ({:.2} earned)",
                holding.value, holding.earnings
            )?;
        }
    }

    Ok(())
}

fn render_stats(stats: &BankStats, out: &mut dyn Write) -> io::Result<()> {
    if stats.accounts == 0 {
        return writeln!(out, "No accounts");
    }

    writeln!(out, "Accounts: {}", stats.accounts)?;
    writeln!(out, "Total balance: {:.2}", stats.total_balance)?;
    writeln!(out, "Average balance: {:.2}", stats.average_balance)?;
    writeln!(out, "Reward points: {}", stats.total_points)?;
    writeln!(out, "Transactions: {}", stats.total_transactions)?;
    writeln!(out, "Loans outstanding: {:.2}", stats.loan_debt)?;
    writeln!(out, "Invested: {:.2}", stats.invested)?;
    if let Some((name, balance)) = &stats.largest_balance {
        writeln!(out, "Largest balance: {name} ({balance:.2})")?;
    }
    if let Some((name, count)) = &stats.most_active {
        writeln!(out, "Most active: {name} ({count} transactions)")?;
    }
    Ok(())
}

/// Explicit card number, or the owner's first card
fn resolve_card<A, K, L, C>(
    bank: &mut Bank<A, K, L, C>,
    owner: &str,
    card: Option<String>,
) -> Result<String, BankError>
where
    A: Repository<Account>,
    K: Repository<CreditCard>,
    L: AuditStore,
    C: Clock,
{
    match card {
        Some(number) => Ok(number),
        None => Ok(bank.card_for(owner)?.number),
    }
}

fn render_statement(statement: &Statement, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "Card {}", statement.card)?;
    writeln!(out, "Bill: {:.2}  due {}", statement.current_bill, statement.due_date)?;
    writeln!(out, "Available credit: {:.2}", statement.available_credit)?;
    if statement.delinquent {
        writeln!(out, "Status: DELINQUENT")?;
    }

    if !statement.items.is_empty() {
        writeln!(out, "In this bill:")?;
    }
    for line in &statement.items {
        writeln!(
            out,
            "  {} {}/{}  {:.2}",
            line.description, line.sequence, line.count, line.outstanding
        )?;
    }

    if !statement.upcoming.is_empty() {
        writeln!(out, "Upcoming:")?;
    }
    for line in &statement.upcoming {
        writeln!(
            out,
            "  {} {}/{}  {:.2}  due {}",
            line.description, line.sequence, line.count, line.outstanding, line.due_date
        )?;
    }
    Ok(())
}

fn with_output<F>(path: Option<&Path>, out: &mut dyn Write, write: F) -> Result<(), CliError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), String>,
{
    match path {
        Some(path) => {
            let mut file = File::create(path)
                .map_err(|e| CliError::Output(format!("{}: {}", path.display(), e)))?;
            write(&mut file).map_err(CliError::Output)
        }
        None => write(out).map_err(CliError::Output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AuditLog, FixedClock};
    use crate::io::{InMemoryAuditStore, InMemoryStore};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn run<A, K, L, C>(bank: &mut Bank<A, K, L, C>, command: Command) -> Result<String, CliError>
    where
        A: Repository<Account>,
        K: Repository<CreditCard>,
        L: AuditStore,
        C: Clock,
    {
        let mut out = Vec::new();
        execute(bank, command, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn bank(
        clock: &FixedClock,
    ) -> Bank<InMemoryStore<Account>, InMemoryStore<CreditCard>, InMemoryAuditStore, &FixedClock>
    {
        Bank::new(
            InMemoryStore::new(),
            InMemoryStore::new(),
            AuditLog::new(InMemoryAuditStore::new()),
            clock,
        )
    }

    #[test]
    fn test_account_commands() {
        let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let mut bank = bank(&clock);

        run(&mut bank, Command::Open { username: "ana".into() }).unwrap();
        let deposit = run(
            &mut bank,
            Command::Deposit {
                username: "ana".into(),
                amount: dec!(100),
            },
        )
        .unwrap();
        let balance = run(&mut bank, Command::Balance { username: "ana".into() }).unwrap();

        assert_eq!(deposit, "Balance: 100.00\n");
        assert_eq!(balance, "Balance: 100.00\nReward points: 0\n");
    }

    #[test]
    fn test_purchase_without_card_uses_first_card() {
        let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let mut bank = bank(&clock);
        run(&mut bank, Command::Open { username: "ana".into() }).unwrap();

        let output = run(
            &mut bank,
            Command::Card {
                command: CardCommand::Purchase {
                    username: "ana".into(),
                    amount: dec!(300),
                    installments: 3,
                    description: "chair".into(),
                    card: None,
                },
            },
        )
        .unwrap();

        assert!(output.contains("3x 102.00"));
        assert!(output.contains("total 306.00"));
        let statement = run(
            &mut bank,
            Command::Card {
                command: CardCommand::Statement {
                    username: "ana".into(),
                    card: None,
                },
            },
        )
        .unwrap();
        assert!(statement.contains("Bill: 102.00  due 2024-03-11"));
        assert!(statement.contains("  chair 2/3  102.00  due 2024-03-31"));
    }

    #[test]
    fn test_history_limit_keeps_most_recent() {
        let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let mut bank = bank(&clock);
        bank.open_account("ana").unwrap();
        bank.deposit("ana", dec!(10)).unwrap();
        bank.withdraw("ana", dec!(3)).unwrap();

        let output = run(
            &mut bank,
            Command::History {
                username: "ana".into(),
                limit: Some(1),
            },
        )
        .unwrap();

        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("WITHDRAWAL"));
    }

    #[test]
    fn test_export_accounts_to_stdout() {
        let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let mut bank = bank(&clock);
        bank.open_account("bob").unwrap();
        bank.open_account("ana").unwrap();

        let output = run(&mut bank, Command::ExportAccounts { output: None }).unwrap();

        let lines: Vec<_> = output.lines().collect();
        assert_eq!(
            lines[0],
            "username,balance,reward_points,created_at,transactions,loan_debt"
        );
        assert!(lines[1].starts_with("ana,0.00,0,"));
        assert!(lines[2].starts_with("bob,"));
    }

    #[test]
    fn test_loan_commands() {
        let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let mut bank = bank(&clock);
        bank.open_account("ana").unwrap();
        bank.deposit("ana", dec!(200)).unwrap();

        let taken = run(
            &mut bank,
            Command::Loan {
                command: LoanCommand::Take {
                    username: "ana".into(),
                    amount: dec!(100),
                    installments: 3,
                },
            },
        )
        .unwrap();
        let listed = run(
            &mut bank,
            Command::Loan {
                command: LoanCommand::List { username: "ana".into() },
            },
        )
        .unwrap();
        let paid = run(
            &mut bank,
            Command::Loan {
                command: LoanCommand::Pay {
                    username: "ana".into(),
                    loan: 1,
                },
            },
        )
        .unwrap();

        assert_eq!(taken, "Loan #1 approved: 3x 35.37 (total 106.12)\n");
        assert!(listed.contains("owed 106.12  3 x 35.37 left"));
        assert!(listed.ends_with("Total owed: 106.12\n"));
        assert_eq!(paid, "Paid 35.37 on loan #1, 70.75 left\n");
    }

    #[test]
    fn test_invest_commands() {
        let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let mut bank = bank(&clock);
        bank.open_account("ana").unwrap();
        bank.deposit("ana", dec!(500)).unwrap();

        run(
            &mut bank,
            Command::Invest {
                command: InvestCommand::New {
                    username: "ana".into(),
                    kind: InvestmentKind::Bitcoin,
                    amount: dec!(500),
                },
            },
        )
        .unwrap();
        clock.advance_days(60);
        let listed = run(
            &mut bank,
            Command::Invest {
                command: InvestCommand::List { username: "ana".into() },
            },
        )
        .unwrap();
        let redeemed = run(
            &mut bank,
            Command::Invest {
                command: InvestCommand::Redeem {
                    username: "ana".into(),
                    investment: 1,
                },
            },
        )
        .unwrap();
        let options = run(
            &mut bank,
            Command::Invest {
                command: InvestCommand::Options,
            },
        )
        .unwrap();

        assert!(listed.contains("value 520.20  earned 20.20"));
        assert_eq!(redeemed, "Redeemed #1 for 520.20 (20.20 earned)\n");
        assert_eq!(options.lines().count(), 5);
        assert!(options.contains("bitcoin     24.0% a year  risk: very high"));
    }

    #[test]
    fn test_stats_command() {
        let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let mut bank = bank(&clock);

        let empty = run(&mut bank, Command::Stats).unwrap();
        bank.open_account("ana").unwrap();
        bank.deposit("ana", dec!(80)).unwrap();
        let report = run(&mut bank, Command::Stats).unwrap();

        assert_eq!(empty, "No accounts\n");
        assert!(report.contains("Accounts: 1\n"));
        assert!(report.contains("Average balance: 80.00\n"));
        assert!(report.contains("Largest balance: ana (80.00)\n"));
        assert!(report.contains("Most active: ana (1 transactions)\n"));
    }

    #[test]
    fn test_bank_error_surfaces() {
        let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let mut bank = bank(&clock);

        let result = run(&mut bank, Command::Balance { username: "ghost".into() });

        assert!(matches!(
            result,
            Err(CliError::Bank(BankError::AccountNotFound { .. }))
        ));
    }
}
