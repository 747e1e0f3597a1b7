//! Feed sync orchestration.
//!
//! One account at a time: mark the attempt, walk the feed's pages from the
//! stored cursor, merge each page durably, then advance the cursor with a
//! conditional update. Only after the whole pull succeeds does the alert
//! pass run. Two triggers may overlap at any point; the merge is idempotent
//! and the cursor CAS picks the single writer, so overlap costs duplicate
//! fetches and nothing else.

use std::sync::Arc;

use log::{debug, error, info};

use florin_core::accounts::AccountServiceTrait;
use florin_core::alerts::AlertServiceTrait;
use florin_core::sync::FeedSyncStateRepositoryTrait;
use florin_core::transactions::TransactionServiceTrait;
use florin_core::{Error, Result};

use super::mapping;
use super::models::{FeedSyncConfig, FeedSyncSummary, SyncAllOutcome};
use super::traits::{FeedClient, FeedSyncServiceTrait};
use async_trait::async_trait;

pub struct FeedSyncService {
    client: Arc<dyn FeedClient>,
    accounts: Arc<dyn AccountServiceTrait>,
    transactions: Arc<dyn TransactionServiceTrait>,
    alerts: Arc<dyn AlertServiceTrait>,
    sync_state: Arc<dyn FeedSyncStateRepositoryTrait>,
    config: FeedSyncConfig,
}

impl FeedSyncService {
    pub fn new(
        client: Arc<dyn FeedClient>,
        accounts: Arc<dyn AccountServiceTrait>,
        transactions: Arc<dyn TransactionServiceTrait>,
        alerts: Arc<dyn AlertServiceTrait>,
        sync_state: Arc<dyn FeedSyncStateRepositoryTrait>,
        config: FeedSyncConfig,
    ) -> Self {
        Self {
            client,
            accounts,
            transactions,
            alerts,
            sync_state,
            config,
        }
    }

    /// Walks pages from `cursor` until the feed reports no more.
    ///
    /// Each iteration merges one page before the cursor moves; a failure at
    /// any point leaves the cursor on the last merged page, so the next
    /// attempt re-fetches at most the page that was in flight.
    async fn pull_pages(
        &self,
        account_id: &str,
        mut cursor: Option<String>,
        summary: &mut FeedSyncSummary,
    ) -> Result<()> {
        loop {
            if summary.pages >= self.config.max_pages {
                return Err(Error::Feed(format!(
                    "Pagination exceeded max pages ({}) for account {}",
                    self.config.max_pages, account_id
                )));
            }

            let page = self.client.fetch_page(account_id, cursor.as_deref()).await?;
            summary.pages += 1;

            if page.has_more && cursor.as_deref() == Some(page.next_cursor.as_str()) {
                return Err(Error::Feed(
                    "Pagination appears stuck (cursor did not advance)".to_string(),
                ));
            }

            let (changes, malformed) = mapping::to_changes(&page);
            summary.skipped += malformed;

            let outcome = self.transactions.apply_changes(account_id, changes).await?;
            summary.added += outcome.added;
            summary.updated += outcome.updated;
            summary.unchanged += outcome.unchanged;
            summary.removed += outcome.removed;
            summary.skipped += outcome.skipped;

            debug!(
                "Merged page {} for account {}: {} added, {} updated, {} removed",
                summary.pages, account_id, outcome.added, outcome.updated, outcome.removed
            );

            let advanced = self
                .sync_state
                .advance_cursor(account_id, cursor.as_deref(), &page.next_cursor)
                .await?;
            if !advanced {
                // A concurrent sync moved the cursor past us. Its pages
                // cover ours and both merges were idempotent, so there is
                // nothing left for this attempt to do.
                info!(
                    "Sync for account {} yielded to a concurrent run after {} pages",
                    account_id, summary.pages
                );
                return Ok(());
            }
            cursor = Some(page.next_cursor);

            if !page.has_more {
                return Ok(());
            }
        }
    }
}

#[async_trait]
impl FeedSyncServiceTrait for FeedSyncService {
    async fn sync_account(&self, account_id: &str) -> Result<FeedSyncSummary> {
        let account = self.accounts.get_account(account_id)?;
        let state = self.sync_state.mark_attempt(&account.id).await?;

        info!(
            "Syncing account '{}' from cursor {:?}",
            account.name, state.cursor
        );

        let mut summary = FeedSyncSummary::default();
        if let Err(err) = self
            .pull_pages(&account.id, state.cursor, &mut summary)
            .await
        {
            // The cursor still points at the last durably merged page; the
            // next attempt resumes there.
            let _ = self
                .sync_state
                .mark_failure(&account.id, &err.to_string())
                .await;
            return Err(err);
        }

        self.sync_state.mark_success(&account.id).await?;

        summary.alerts = self.alerts.dispatch_pending(&account).await?;

        info!(
            "Synced account '{}': {} pages, {} added, {} updated, {} removed, {} skipped, {} alerts delivered",
            account.name,
            summary.pages,
            summary.added,
            summary.updated,
            summary.removed,
            summary.skipped,
            summary.alerts.delivered
        );

        Ok(summary)
    }

    async fn sync_all(&self) -> Result<SyncAllOutcome> {
        let accounts = self.accounts.get_active_accounts()?;
        info!("Syncing {} active accounts", accounts.len());

        let mut outcome = SyncAllOutcome::default();
        for account in accounts {
            match self.sync_account(&account.id).await {
                Ok(_) => outcome.accounts_synced += 1,
                Err(err) => {
                    error!("Failed to sync account '{}': {}", account.name, err);
                    outcome.errors.push(format!("{}: {}", account.name, err));
                    outcome.accounts_failed += 1;
                }
            }
        }

        Ok(outcome)
    }
}
