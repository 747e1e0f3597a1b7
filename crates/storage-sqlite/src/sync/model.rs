//! Database models for feed sync state.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use florin_core::sync::FeedSyncState;

use crate::schema::feed_sync_state;

/// Database model for per-account feed sync state
#[derive(
    Debug, Clone, Queryable, Identifiable, Insertable, AsChangeset, Selectable, Serialize,
    Deserialize,
)]
#[diesel(table_name = feed_sync_state)]
#[diesel(primary_key(account_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FeedSyncStateDB {
    pub account_id: String,
    pub cursor: Option<String>,
    pub sync_status: String,
    pub last_attempted_at: Option<String>,
    pub last_successful_at: Option<String>,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial update changeset; `None` fields are left untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = feed_sync_state)]
pub struct FeedSyncStateUpdateDB {
    pub sync_status: Option<String>,
    pub last_attempted_at: Option<Option<String>>,
    pub last_successful_at: Option<Option<String>>,
    pub last_error: Option<Option<String>>,
    pub updated_at: Option<String>,
}

impl From<FeedSyncStateDB> for FeedSyncState {
    fn from(db: FeedSyncStateDB) -> Self {
        Self {
            account_id: db.account_id,
            cursor: db.cursor,
            sync_status: serde_json::from_str(&format!("\"{}\"", db.sync_status))
                .unwrap_or_default(),
            last_attempted_at: db.last_attempted_at.and_then(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
            last_successful_at: db.last_successful_at.and_then(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
            last_error: db.last_error,
            created_at: DateTime::parse_from_rfc3339(&db.created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            updated_at: DateTime::parse_from_rfc3339(&db.updated_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }
    }
}

impl From<FeedSyncState> for FeedSyncStateDB {
    fn from(domain: FeedSyncState) -> Self {
        Self {
            account_id: domain.account_id,
            cursor: domain.cursor,
            sync_status: serde_json::to_string(&domain.sync_status)
                .unwrap_or_default()
                .trim_matches('"')
                .to_string(),
            last_attempted_at: domain.last_attempted_at.map(|dt| dt.to_rfc3339()),
            last_successful_at: domain.last_successful_at.map(|dt| dt.to_rfc3339()),
            last_error: domain.last_error,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }
}
