//! Feed sync state domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a sync operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    /// No sync in progress
    #[default]
    Idle,
    /// Sync is running
    Running,
    /// Sync failed
    Failed,
}

/// Tracks feed sync progress for one account.
///
/// The cursor is the feed's opaque resume token. It only ever moves through
/// the repository's conditional advance, after the page fetched at that
/// cursor has been durably merged; a crash therefore re-fetches at most the
/// in-flight page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSyncState {
    /// Account this state belongs to
    pub account_id: String,
    /// Opaque feed resume token; `None` means never synced
    pub cursor: Option<String>,
    /// Current sync status
    pub sync_status: SyncStatus,
    /// When sync was last attempted
    pub last_attempted_at: Option<DateTime<Utc>>,
    /// When sync last succeeded
    pub last_successful_at: Option<DateTime<Utc>>,
    /// Last error message if failed
    pub last_error: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl FeedSyncState {
    /// Create new sync state for an account
    pub fn new(account_id: String) -> Self {
        let now = Utc::now();
        Self {
            account_id,
            cursor: None,
            sync_status: SyncStatus::Idle,
            last_attempted_at: None,
            last_successful_at: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark sync as started
    pub fn start_sync(&mut self) {
        self.sync_status = SyncStatus::Running;
        self.last_attempted_at = Some(Utc::now());
        self.last_error = None;
        self.updated_at = Utc::now();
    }

    /// Mark sync as completed successfully
    pub fn complete_sync(&mut self) {
        self.sync_status = SyncStatus::Idle;
        self.last_successful_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    /// Mark sync as failed
    pub fn fail_sync(&mut self, error: String) {
        self.sync_status = SyncStatus::Failed;
        self.last_error = Some(error);
        self.updated_at = Utc::now();
    }
}
