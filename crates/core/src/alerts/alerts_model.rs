//! Alert dispatch models.

use serde::{Deserialize, Serialize};

use crate::accounts::Account;
use crate::transactions::Transaction;

/// Accounting for one alert dispatch pass over an account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRunSummary {
    /// Transactions that were eligible when the pass started
    pub eligible: usize,
    /// Claims this pass won
    pub claimed: usize,
    /// Alerts the relay accepted
    pub delivered: usize,
    /// Claims lost to a concurrent pass
    pub lost_races: usize,
    /// Deliveries that failed and were rolled back
    pub failed: usize,
}

impl AlertRunSummary {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Renders the relay message for a spending alert.
pub fn format_alert_message(transaction: &Transaction, account: &Account) -> String {
    let merchant = transaction
        .merchant
        .as_deref()
        .unwrap_or(&transaction.description);

    format!(
        "{}: {} {} at {}",
        account.name, transaction.amount, transaction.currency, merchant
    )
}
