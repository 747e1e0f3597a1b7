//! Models representing transaction data from the upstream feed API.
//!
//! These mirror the provider's response structures; everything is stringly
//! typed on the wire and converted in `mapping`.

use serde::{Deserialize, Serialize};

use florin_core::alerts::AlertRunSummary;

/// One raw transaction record as the feed delivers it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeedTransaction {
    /// Provider identity, unique within the account
    pub external_id: String,

    /// Provider id of the provisional record this one replaces
    #[serde(default)]
    pub pending_external_id: Option<String>,

    /// Decimal string; positive is money leaving the account
    pub amount: String,

    /// Currency code (e.g., "USD", "EUR")
    pub currency: String,

    /// Raw statement descriptor
    #[serde(default)]
    pub description: Option<String>,

    /// Cleaned merchant name, when the provider resolves one
    #[serde(default)]
    pub merchant: Option<String>,

    /// Category assigned by the provider
    #[serde(default)]
    pub category: Option<String>,

    /// `PENDING` or `POSTED`; anything else is treated as posted
    #[serde(default)]
    pub status: Option<String>,

    /// RFC3339 timestamp the provider booked the transaction at
    pub posted_at: String,
}

/// One page of deltas from the feed.
///
/// `next_cursor` resumes after this page; the same cursor always returns
/// the same page until the feed advances.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    /// Records not seen before at this cursor
    #[serde(default)]
    pub added: Vec<FeedTransaction>,

    /// Records delivered earlier and since changed upstream
    #[serde(default)]
    pub modified: Vec<FeedTransaction>,

    /// External ids the provider retracted
    #[serde(default)]
    pub removed: Vec<String>,

    /// Cursor to resume from after this page is merged
    pub next_cursor: String,

    /// Whether more pages are immediately available
    #[serde(default)]
    pub has_more: bool,
}

/// Configuration for feed sync operations.
#[derive(Debug, Clone)]
pub struct FeedSyncConfig {
    /// Maximum number of pages to fetch per account (safety limit).
    pub max_pages: usize,
}

impl Default for FeedSyncConfig {
    fn default() -> Self {
        Self { max_pages: 500 }
    }
}

/// Accounting for one account's sync run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSyncSummary {
    /// Pages fetched and merged
    pub pages: usize,
    /// Transactions newly created
    pub added: usize,
    /// Transactions updated in place
    pub updated: usize,
    /// Upserts that matched the stored row exactly
    pub unchanged: usize,
    /// Transactions deleted by removal notices
    pub removed: usize,
    /// Records dropped as malformed
    pub skipped: usize,
    /// Outcome of the alert pass that follows a successful sync
    pub alerts: AlertRunSummary,
}

/// Aggregate outcome of syncing every active account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncAllOutcome {
    pub accounts_synced: usize,
    pub accounts_failed: usize,
    /// One "account name: error" entry per failed account
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_sync_config_default() {
        let config = FeedSyncConfig::default();
        assert_eq!(config.max_pages, 500);
    }

    #[test]
    fn test_feed_page_deserializes_with_missing_lists() {
        let page: FeedPage =
            serde_json::from_str(r#"{"nextCursor": "abc"}"#).expect("page should deserialize");
        assert!(page.added.is_empty());
        assert!(page.modified.is_empty());
        assert!(page.removed.is_empty());
        assert_eq!(page.next_cursor, "abc");
        assert!(!page.has_more);
    }

    #[test]
    fn test_feed_transaction_deserializes_sparse_record() {
        let record: FeedTransaction = serde_json::from_str(
            r#"{
                "externalId": "ext-1",
                "amount": "4.50",
                "currency": "USD",
                "postedAt": "2026-07-01T12:00:00Z"
            }"#,
        )
        .expect("record should deserialize");
        assert_eq!(record.external_id, "ext-1");
        assert!(record.pending_external_id.is_none());
        assert!(record.status.is_none());
    }
}
