//! Alert repository, relay, and service traits.

use async_trait::async_trait;

use super::alerts_model::AlertRunSummary;
use crate::accounts::Account;
use crate::errors::Result;
use crate::transactions::Transaction;

/// Trait defining the contract for alert claim bookkeeping.
///
/// A claim is a single conditional update on the transaction row; whoever
/// flips `notified_at` from NULL wins, every other caller observes a lost
/// race. No lock is held outside the statement itself.
#[async_trait]
pub trait AlertRepositoryTrait: Send + Sync {
    /// Attempts to claim the alert for a transaction.
    ///
    /// Returns `true` when this caller won the claim, `false` when another
    /// worker already holds it. Losing is not an error.
    async fn try_claim(&self, transaction_id: &str) -> Result<bool>;

    /// Records the relay confirmation for a delivered alert.
    async fn confirm(&self, transaction_id: &str, delivery_id: &str) -> Result<()>;

    /// Rolls a claim back after a failed delivery so a later pass retries.
    async fn release(&self, transaction_id: &str) -> Result<()>;

    /// Lists an account's transactions still awaiting an alert, oldest first.
    fn list_alertable(&self, account_id: &str) -> Result<Vec<Transaction>>;

    /// Counts claims that never got a relay confirmation.
    ///
    /// Non-zero means a worker died between claim and confirm. Those claims
    /// are never retried automatically; this count keeps the loss visible.
    fn count_unconfirmed(&self) -> Result<i64>;
}

/// Outbound messaging relay.
///
/// Implementations wrap a concrete provider (SMS, push, chat). Returning
/// `Ok` means the relay accepted the message and issued a delivery id.
#[async_trait]
pub trait AlertRelay: Send + Sync {
    async fn deliver(&self, recipient: &str, message: &str) -> Result<String>;
}

/// Trait defining the contract for alert dispatch.
#[async_trait]
pub trait AlertServiceTrait: Send + Sync {
    /// Claims and delivers every eligible alert for an account.
    ///
    /// Safe to run concurrently with itself; claims keep the passes from
    /// double-sending.
    async fn dispatch_pending(&self, account: &Account) -> Result<AlertRunSummary>;

    /// Counts claims with no recorded delivery, across all accounts.
    fn unconfirmed_count(&self) -> Result<i64>;
}
