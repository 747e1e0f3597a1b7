use log::{debug, warn};
use std::sync::Arc;

use super::transactions_model::{
    MergeOutcome, Transaction, TransactionChanges, TransactionLocalUpdate,
};
use super::transactions_traits::{TransactionRepositoryTrait, TransactionServiceTrait};
use crate::Result;

/// Service for merging feed transactions and applying user edits
pub struct TransactionService {
    repository: Arc<dyn TransactionRepositoryTrait>,
}

impl TransactionService {
    /// Creates a new TransactionService instance
    pub fn new(repository: Arc<dyn TransactionRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// Drops malformed records from a page, returning the clean page and the
    /// number of records dropped.
    fn screen_changes(&self, changes: TransactionChanges) -> (TransactionChanges, usize) {
        let mut skipped = 0;

        let upserts = changes
            .upserts
            .into_iter()
            .filter(|upsert| match upsert.validate() {
                Ok(()) => true,
                Err(err) => {
                    warn!(
                        "Skipping malformed feed record '{}': {}",
                        upsert.external_id, err
                    );
                    skipped += 1;
                    false
                }
            })
            .collect();

        let removed_external_ids = changes
            .removed_external_ids
            .into_iter()
            .filter(|external_id| {
                if external_id.trim().is_empty() {
                    warn!("Skipping removal notice with empty external id");
                    skipped += 1;
                    false
                } else {
                    true
                }
            })
            .collect();

        (
            TransactionChanges {
                upserts,
                removed_external_ids,
            },
            skipped,
        )
    }
}

#[async_trait::async_trait]
impl TransactionServiceTrait for TransactionService {
    async fn apply_changes(
        &self,
        account_id: &str,
        changes: TransactionChanges,
    ) -> Result<MergeOutcome> {
        let (clean, skipped) = self.screen_changes(changes);

        if clean.is_empty() {
            debug!("No applicable changes for account {}", account_id);
            return Ok(MergeOutcome {
                skipped,
                ..Default::default()
            });
        }

        debug!(
            "Merging {} upserts and {} removals for account {}",
            clean.upserts.len(),
            clean.removed_external_ids.len(),
            account_id
        );

        let mut outcome = self.repository.merge(account_id, clean).await?;
        outcome.skipped += skipped;
        Ok(outcome)
    }

    async fn update_local_fields(&self, update: TransactionLocalUpdate) -> Result<Transaction> {
        update.validate()?;
        self.repository.update_local(update).await
    }

    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        self.repository.get_by_id(transaction_id)
    }

    fn get_transactions(&self, account_id: &str) -> Result<Vec<Transaction>> {
        self.repository.list_for_account(account_id)
    }
}
