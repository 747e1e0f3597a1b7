//! Tests for feed sync state models.

use super::*;

// ============================================================================
// SyncStatus Tests
// ============================================================================

mod sync_status_tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert_eq!(SyncStatus::default(), SyncStatus::Idle);
    }

    #[test]
    fn test_serialization() {
        assert_eq!(
            serde_json::to_string(&SyncStatus::Running).unwrap(),
            r#""RUNNING""#
        );
        assert_eq!(
            serde_json::to_string(&SyncStatus::Failed).unwrap(),
            r#""FAILED""#
        );

        let idle: SyncStatus = serde_json::from_str(r#""IDLE""#).unwrap();
        assert_eq!(idle, SyncStatus::Idle);
    }
}

// ============================================================================
// FeedSyncState Tests
// ============================================================================

mod feed_sync_state_tests {
    use super::*;

    #[test]
    fn test_new_state_is_unsynced() {
        let state = FeedSyncState::new("account-123".to_string());

        assert_eq!(state.account_id, "account-123");
        assert!(state.cursor.is_none());
        assert_eq!(state.sync_status, SyncStatus::Idle);
        assert!(state.last_attempted_at.is_none());
        assert!(state.last_successful_at.is_none());
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_start_sync_clears_previous_error() {
        let mut state = FeedSyncState::new("account-123".to_string());
        state.fail_sync("upstream 503".to_string());
        assert_eq!(state.sync_status, SyncStatus::Failed);

        state.start_sync();

        assert_eq!(state.sync_status, SyncStatus::Running);
        assert!(state.last_attempted_at.is_some());
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_complete_sync() {
        let mut state = FeedSyncState::new("account-123".to_string());
        state.start_sync();
        state.complete_sync();

        assert_eq!(state.sync_status, SyncStatus::Idle);
        assert!(state.last_successful_at.is_some());
    }

    #[test]
    fn test_fail_sync_keeps_cursor() {
        let mut state = FeedSyncState::new("account-123".to_string());
        state.cursor = Some("cur-42".to_string());
        state.start_sync();
        state.fail_sync("connection reset".to_string());

        assert_eq!(state.sync_status, SyncStatus::Failed);
        assert_eq!(state.last_error, Some("connection reset".to_string()));
        // The resume token survives the failure untouched.
        assert_eq!(state.cursor, Some("cur-42".to_string()));
    }
}
