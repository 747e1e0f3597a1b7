use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use florin_core::sync::{FeedSyncState, FeedSyncStateRepositoryTrait};
use florin_core::Result;

use super::model::{FeedSyncStateDB, FeedSyncStateUpdateDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::feed_sync_state;
use async_trait::async_trait;

const STATUS_IDLE: &str = "IDLE";
const STATUS_RUNNING: &str = "RUNNING";
const STATUS_FAILED: &str = "FAILED";

pub struct FeedSyncStateRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl FeedSyncStateRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

/// Loads the row for an account, inserting a fresh idle one if missing.
fn load_or_insert(conn: &mut SqliteConnection, account_id: &str) -> Result<FeedSyncStateDB> {
    let existing = feed_sync_state::table
        .find(account_id)
        .select(FeedSyncStateDB::as_select())
        .first::<FeedSyncStateDB>(conn)
        .optional()
        .map_err(StorageError::from)?;

    match existing {
        Some(row) => Ok(row),
        None => {
            let fresh = FeedSyncStateDB::from(FeedSyncState::new(account_id.to_string()));
            let inserted = diesel::insert_into(feed_sync_state::table)
                .values(&fresh)
                .get_result::<FeedSyncStateDB>(conn)
                .map_err(StorageError::from)?;
            Ok(inserted)
        }
    }
}

#[async_trait]
impl FeedSyncStateRepositoryTrait for FeedSyncStateRepository {
    fn get(&self, account_id: &str) -> Result<Option<FeedSyncState>> {
        let mut conn = get_connection(&self.pool)?;
        let result = feed_sync_state::table
            .find(account_id)
            .select(FeedSyncStateDB::as_select())
            .first::<FeedSyncStateDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(result.map(FeedSyncState::from))
    }

    async fn get_or_create(&self, account_id: &str) -> Result<FeedSyncState> {
        let account_id_owned = account_id.to_string();

        self.writer
            .exec(
                move |conn: &mut SqliteConnection| -> Result<FeedSyncState> {
                    let row = load_or_insert(conn, &account_id_owned)?;
                    Ok(FeedSyncState::from(row))
                },
            )
            .await
    }

    async fn mark_attempt(&self, account_id: &str) -> Result<FeedSyncState> {
        let account_id_owned = account_id.to_string();

        self.writer
            .exec(
                move |conn: &mut SqliteConnection| -> Result<FeedSyncState> {
                    load_or_insert(conn, &account_id_owned)?;

                    let now = Utc::now().to_rfc3339();
                    let update = FeedSyncStateUpdateDB {
                        sync_status: Some(STATUS_RUNNING.to_string()),
                        last_attempted_at: Some(Some(now.clone())),
                        last_error: Some(None),
                        updated_at: Some(now),
                        ..Default::default()
                    };

                    let row = diesel::update(feed_sync_state::table.find(&account_id_owned))
                        .set(&update)
                        .get_result::<FeedSyncStateDB>(conn)
                        .map_err(StorageError::from)?;

                    Ok(FeedSyncState::from(row))
                },
            )
            .await
    }

    async fn mark_success(&self, account_id: &str) -> Result<FeedSyncState> {
        let account_id_owned = account_id.to_string();

        self.writer
            .exec(
                move |conn: &mut SqliteConnection| -> Result<FeedSyncState> {
                    let now = Utc::now().to_rfc3339();
                    let update = FeedSyncStateUpdateDB {
                        sync_status: Some(STATUS_IDLE.to_string()),
                        last_successful_at: Some(Some(now.clone())),
                        updated_at: Some(now),
                        ..Default::default()
                    };

                    let row = diesel::update(feed_sync_state::table.find(&account_id_owned))
                        .set(&update)
                        .get_result::<FeedSyncStateDB>(conn)
                        .map_err(StorageError::from)?;

                    Ok(FeedSyncState::from(row))
                },
            )
            .await
    }

    async fn mark_failure(&self, account_id: &str, error: &str) -> Result<FeedSyncState> {
        let account_id_owned = account_id.to_string();
        let error_owned = error.to_string();

        self.writer
            .exec(
                move |conn: &mut SqliteConnection| -> Result<FeedSyncState> {
                    let now = Utc::now().to_rfc3339();
                    let update = FeedSyncStateUpdateDB {
                        sync_status: Some(STATUS_FAILED.to_string()),
                        last_error: Some(Some(error_owned)),
                        updated_at: Some(now),
                        ..Default::default()
                    };

                    let row = diesel::update(feed_sync_state::table.find(&account_id_owned))
                        .set(&update)
                        .get_result::<FeedSyncStateDB>(conn)
                        .map_err(StorageError::from)?;

                    Ok(FeedSyncState::from(row))
                },
            )
            .await
    }

    /// Conditional cursor advance.
    ///
    /// The WHERE clause carries the cursor value this sync observed, so two
    /// overlapping syncs can both try and exactly one UPDATE lands. The
    /// cursor never moves unless the page fetched at `observed` has already
    /// been merged in a committed transaction.
    async fn advance_cursor(
        &self,
        account_id: &str,
        observed: Option<&str>,
        next: &str,
    ) -> Result<bool> {
        let account_id_owned = account_id.to_string();
        let observed_owned = observed.map(|s| s.to_string());
        let next_owned = next.to_string();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<bool> {
                let now = Utc::now().to_rfc3339();

                let affected = match &observed_owned {
                    Some(expected) => diesel::update(
                        feed_sync_state::table
                            .find(&account_id_owned)
                            .filter(feed_sync_state::cursor.eq(expected)),
                    )
                    .set((
                        feed_sync_state::cursor.eq(&next_owned),
                        feed_sync_state::updated_at.eq(&now),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?,
                    None => diesel::update(
                        feed_sync_state::table
                            .find(&account_id_owned)
                            .filter(feed_sync_state::cursor.is_null()),
                    )
                    .set((
                        feed_sync_state::cursor.eq(&next_owned),
                        feed_sync_state::updated_at.eq(&now),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?,
                };

                if affected == 0 {
                    debug!(
                        "Cursor advance for account {} lost to a concurrent sync",
                        account_id_owned
                    );
                }

                Ok(affected == 1)
            })
            .await
    }
}
