//! CSV export of accounts and transaction history
//!
//! This module centralizes all CSV format concerns. Amounts are written
//! with two decimal places and timestamps as RFC 3339. Both writers take any
//! `Write` so they can target stdout or a file.

use crate::types::{Account, TransactionEntry};
use csv::Writer;
use std::io::Write;

/// Write account states to CSV format
///
/// Writes accounts with columns: username, balance, reward_points,
/// created_at, transactions (history length) and loan_debt (owed on active
/// loans). Accounts are sorted by username for deterministic output.
///
/// # Arguments
///
/// * `accounts` - Slice of accounts to write
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), String> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record([
            "username",
            "balance",
            "reward_points",
            "created_at",
            "transactions",
            "loan_debt",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted: Vec<&Account> = accounts.iter().collect();
    sorted.sort_by(|a, b| a.username.cmp(&b.username));

    for account in sorted {
        writer
            .write_record([
                account.username.clone(),
                format!("{:.2}", account.balance),
                account.reward_points.to_string(),
                account.created_at.to_rfc3339(),
                account.history.len().to_string(),
                format!("{:.2}", account.loan_debt()),
            ])
            .map_err(|e| {
                format!(
                    "Failed to write account {} to CSV: {}",
                    account.username, e
                )
            })?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush CSV output: {}", e))?;

    Ok(())
}

/// Write an account's transaction history to CSV format
///
/// Columns: timestamp, description, amount. Entries keep their
/// chronological order.
pub fn write_history_csv(
    entries: &[TransactionEntry],
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["timestamp", "description", "amount"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for entry in entries {
        writer
            .write_record([
                entry.timestamp.to_rfc3339(),
                entry.description.clone(),
                format!("{:.2}", entry.amount),
            ])
            .map_err(|e| format!("Failed to write history entry to CSV: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush CSV output: {}", e))?;

    Ok(())
}
