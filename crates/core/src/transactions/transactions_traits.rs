//! Transaction repository and service traits.

use async_trait::async_trait;

use super::transactions_model::{
    MergeOutcome, Transaction, TransactionChanges, TransactionLocalUpdate,
};
use crate::errors::Result;

/// Trait defining the contract for Transaction repository operations.
///
/// The merge contract is the heart of sync correctness: one call applies one
/// feed page in a single storage transaction, so a page is either fully
/// durable or not applied at all.
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    /// Applies one page of feed changes for an account atomically.
    ///
    /// Upserts are applied before removals. Inserts inherit alert bookkeeping
    /// from the pending row named by `pending_external_id`; updates rewrite
    /// only feed-owned columns. Removing an unknown external id is a no-op.
    async fn merge(&self, account_id: &str, changes: TransactionChanges) -> Result<MergeOutcome>;

    /// Updates the user-owned fields of a transaction.
    async fn update_local(&self, update: TransactionLocalUpdate) -> Result<Transaction>;

    /// Retrieves a transaction by its local ID.
    fn get_by_id(&self, transaction_id: &str) -> Result<Transaction>;

    /// Retrieves a transaction by its provider identity.
    fn get_by_external_id(&self, account_id: &str, external_id: &str) -> Result<Transaction>;

    /// Lists an account's transactions, newest first.
    fn list_for_account(&self, account_id: &str) -> Result<Vec<Transaction>>;
}

/// Trait defining the contract for Transaction service operations.
#[async_trait]
pub trait TransactionServiceTrait: Send + Sync {
    /// Validates and merges one page of feed changes.
    ///
    /// Malformed records are dropped from the page and counted in
    /// `MergeOutcome::skipped`; they never abort their siblings.
    async fn apply_changes(
        &self,
        account_id: &str,
        changes: TransactionChanges,
    ) -> Result<MergeOutcome>;

    /// Updates the user-owned fields of a transaction.
    async fn update_local_fields(&self, update: TransactionLocalUpdate) -> Result<Transaction>;

    /// Retrieves a transaction by its local ID.
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction>;

    /// Lists an account's transactions, newest first.
    fn get_transactions(&self, account_id: &str) -> Result<Vec<Transaction>>;
}
