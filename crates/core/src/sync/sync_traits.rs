//! Feed sync state repository trait.

use async_trait::async_trait;

use super::sync_state_model::FeedSyncState;
use crate::errors::Result;

/// Trait for feed sync state repository operations.
#[async_trait]
pub trait FeedSyncStateRepositoryTrait: Send + Sync {
    /// Get sync state for an account, if any.
    fn get(&self, account_id: &str) -> Result<Option<FeedSyncState>>;

    /// Get sync state for an account, creating an idle one if missing.
    async fn get_or_create(&self, account_id: &str) -> Result<FeedSyncState>;

    /// Record a sync attempt starting (status becomes RUNNING).
    async fn mark_attempt(&self, account_id: &str) -> Result<FeedSyncState>;

    /// Record a successful sync (status back to IDLE).
    async fn mark_success(&self, account_id: &str) -> Result<FeedSyncState>;

    /// Record a failed sync with its error message.
    async fn mark_failure(&self, account_id: &str, error: &str) -> Result<FeedSyncState>;

    /// Advance the cursor, but only if it still holds the value this sync
    /// observed when fetching the page.
    ///
    /// Returns `false` when a concurrent sync already moved it; the caller
    /// should stop, its remaining work has been done by the winner.
    async fn advance_cursor(
        &self,
        account_id: &str,
        observed: Option<&str>,
        next: &str,
    ) -> Result<bool>;
}
