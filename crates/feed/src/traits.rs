//! Traits defining the contract for feed sync operations.

use async_trait::async_trait;

use super::models::{FeedPage, FeedSyncSummary, SyncAllOutcome};
use florin_core::errors::Result;

/// Trait for fetching transaction pages from the upstream feed API.
///
/// `cursor` is the provider's opaque resume token; `None` asks for the
/// beginning of the account's history. Fetching at the same cursor twice
/// returns the same page, which is what makes crash-retry safe.
#[async_trait]
pub trait FeedClient: Send + Sync {
    async fn fetch_page(&self, account_id: &str, cursor: Option<&str>) -> Result<FeedPage>;
}

/// Trait for the feed sync service operations.
#[async_trait]
pub trait FeedSyncServiceTrait: Send + Sync {
    /// Pulls all available pages for one account, merges them, then runs
    /// the alert pass.
    async fn sync_account(&self, account_id: &str) -> Result<FeedSyncSummary>;

    /// Syncs every active account, isolating per-account failures.
    async fn sync_all(&self) -> Result<SyncAllOutcome>;
}
