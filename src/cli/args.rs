use crate::config::{BankConfig, LogFormat};
use crate::core::policy::AUDIT_RETENTION;
use crate::types::InvestmentKind;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Bank simulation with a credit-card billing engine
#[derive(Parser, Debug)]
#[command(name = "bank-sim")]
#[command(about = "Bank simulation with a credit-card billing engine", long_about = None)]
pub struct CliArgs {
    /// Directory holding the JSON data files
    #[arg(
        long = "data-dir",
        value_name = "DIR",
        env = "BANK_DATA_DIR",
        default_value = "data",
        global = true
    )]
    pub data_dir: PathBuf,

    /// Fail on corrupt files and malformed records instead of skipping them
    #[arg(long = "strict", env = "BANK_STRICT_RECORDS", global = true)]
    pub strict: bool,

    /// Number of audit entries kept
    #[arg(
        long = "audit-retention",
        value_name = "COUNT",
        default_value_t = AUDIT_RETENTION,
        global = true
    )]
    pub audit_retention: usize,

    /// Log output format (logs go to stderr)
    #[arg(
        long = "log-format",
        value_name = "FORMAT",
        value_enum,
        default_value = "text",
        global = true
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Open a new account
    Open { username: String },

    /// Deposit into an account
    Deposit { username: String, amount: Decimal },

    /// Withdraw from an account
    Withdraw { username: String, amount: Decimal },

    /// Transfer between two accounts
    Transfer {
        from: String,
        to: String,
        amount: Decimal,
    },

    /// Show balance and reward points
    Balance { username: String },

    /// Show transaction history, oldest first
    History {
        username: String,

        /// Only show the most recent entries
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },

    /// Redeem reward points (multiples of 100) for balance
    Redeem { username: String, points: u64 },

    /// Credit-card operations
    Card {
        #[command(subcommand)]
        command: CardCommand,
    },

    /// Personal loans
    Loan {
        #[command(subcommand)]
        command: LoanCommand,
    },

    /// Investments
    Invest {
        #[command(subcommand)]
        command: InvestCommand,
    },

    /// Show bank-wide statistics
    Stats,

    /// Show the audit trail, newest first
    Audit {
        /// Only entries for this account
        #[arg(long)]
        account: Option<String>,

        #[arg(long, value_name = "N", default_value_t = 20)]
        limit: usize,
    },

    /// Export an account's history as CSV
    ExportHistory {
        username: String,

        /// Output file (stdout if omitted)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Export all accounts as CSV
    ExportAccounts {
        /// Output file (stdout if omitted)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CardCommand {
    /// Issue a new card
    Issue { username: String },

    /// List cards with their bill and available credit
    List { username: String },

    /// Charge a purchase
    Purchase {
        username: String,
        amount: Decimal,

        /// Number of installments (1-24)
        #[arg(long, value_name = "N", default_value_t = 1)]
        installments: u32,

        #[arg(long, default_value = "PURCHASE")]
        description: String,

        /// Card number (first card if omitted)
        #[arg(long)]
        card: Option<String>,
    },

    /// Show the bill statement
    Statement {
        username: String,

        #[arg(long)]
        card: Option<String>,
    },

    /// Pay the bill
    Pay {
        username: String,
        amount: Decimal,

        #[arg(long)]
        card: Option<String>,
    },

    /// Settle the whole debt at a discount
    Payoff {
        username: String,

        #[arg(long)]
        card: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum LoanCommand {
    /// Take a loan of up to five times the balance
    Take {
        username: String,
        amount: Decimal,

        /// Number of monthly installments (1-36)
        #[arg(long, value_name = "N", default_value_t = 1)]
        installments: u32,
    },

    /// List active loans
    List { username: String },

    /// Pay the next installment of a loan
    Pay { username: String, loan: u32 },

    /// Repay everything still owed on a loan
    Payoff { username: String, loan: u32 },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum InvestCommand {
    /// List the available products
    Options,

    /// Invest part of the balance
    New {
        username: String,

        /// savings, cdb, treasury, stocks or bitcoin
        kind: InvestmentKind,
        amount: Decimal,
    },

    /// List open investments with their current value
    List { username: String },

    /// Redeem an investment at its current value
    Redeem { username: String, investment: u32 },
}

impl CliArgs {
    /// Create a BankConfig from CLI arguments
    ///
    /// # Returns
    ///
    /// A `BankConfig` with values from CLI arguments, environment or defaults.
    pub fn to_config(&self) -> BankConfig {
        BankConfig::new(&self.data_dir, self.strict, self.audit_retention)
            .with_log_format(self.log_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case::defaults(&["bank-sim", "balance", "ana"], "data", false, AUDIT_RETENTION, LogFormat::Text)]
    #[case::all_global(
        &["bank-sim", "--data-dir", "/tmp/b", "--strict", "--audit-retention", "50",
          "--log-format", "json", "balance", "ana"],
        "/tmp/b",
        true,
        50,
        LogFormat::Json
    )]
    #[case::global_after_subcommand(
        &["bank-sim", "balance", "ana", "--data-dir", "/tmp/b"],
        "/tmp/b",
        false,
        AUDIT_RETENTION,
        LogFormat::Text
    )]
    fn test_global_options(
        #[case] args: &[&str],
        #[case] data_dir: &str,
        #[case] strict: bool,
        #[case] retention: usize,
        #[case] log_format: LogFormat,
    ) {
        let config = CliArgs::try_parse_from(args).unwrap().to_config();

        assert_eq!(config.data_dir, PathBuf::from(data_dir));
        assert_eq!(config.strict_records, strict);
        assert_eq!(config.audit_retention, retention);
        assert_eq!(config.log_format, log_format);
    }

    #[rstest]
    #[case::deposit(
        &["bank-sim", "deposit", "ana", "150.25"],
        Command::Deposit { username: "ana".into(), amount: dec!(150.25) }
    )]
    #[case::transfer(
        &["bank-sim", "transfer", "ana", "bob", "10"],
        Command::Transfer { from: "ana".into(), to: "bob".into(), amount: dec!(10) }
    )]
    #[case::history_limit(
        &["bank-sim", "history", "ana", "--limit", "5"],
        Command::History { username: "ana".into(), limit: Some(5) }
    )]
    #[case::purchase_defaults(
        &["bank-sim", "card", "purchase", "ana", "99.90"],
        Command::Card { command: CardCommand::Purchase {
            username: "ana".into(),
            amount: dec!(99.90),
            installments: 1,
            description: "PURCHASE".into(),
            card: None,
        }}
    )]
    #[case::purchase_full(
        &["bank-sim", "card", "purchase", "ana", "1000", "--installments", "10",
          "--description", "laptop", "--card", "4000123412341234"],
        Command::Card { command: CardCommand::Purchase {
            username: "ana".into(),
            amount: dec!(1000),
            installments: 10,
            description: "laptop".into(),
            card: Some("4000123412341234".into()),
        }}
    )]
    #[case::loan_take(
        &["bank-sim", "loan", "take", "ana", "500", "--installments", "12"],
        Command::Loan { command: LoanCommand::Take {
            username: "ana".into(),
            amount: dec!(500),
            installments: 12,
        }}
    )]
    #[case::loan_pay(
        &["bank-sim", "loan", "pay", "ana", "2"],
        Command::Loan { command: LoanCommand::Pay { username: "ana".into(), loan: 2 } }
    )]
    #[case::invest_new(
        &["bank-sim", "invest", "new", "ana", "CDB", "250.50"],
        Command::Invest { command: InvestCommand::New {
            username: "ana".into(),
            kind: InvestmentKind::Cdb,
            amount: dec!(250.50),
        }}
    )]
    #[case::stats(&["bank-sim", "stats"], Command::Stats)]
    #[case::audit_default_limit(
        &["bank-sim", "audit"],
        Command::Audit { account: None, limit: 20 }
    )]
    fn test_command_parsing(#[case] args: &[&str], #[case] expected: Command) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.command, expected);
    }

    #[rstest]
    #[case::missing_command(&["bank-sim"])]
    #[case::bad_amount(&["bank-sim", "deposit", "ana", "ten"])]
    #[case::bad_log_format(&["bank-sim", "--log-format", "xml", "balance", "ana"])]
    #[case::negative_points(&["bank-sim", "redeem", "ana", "-100"])]
    #[case::unknown_investment(&["bank-sim", "invest", "new", "ana", "tulips", "10"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        let result = CliArgs::try_parse_from(args);
        assert!(result.is_err());
    }
}
