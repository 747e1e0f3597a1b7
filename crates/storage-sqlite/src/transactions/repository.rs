use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use florin_core::transactions::{
    MergeOutcome, Transaction, TransactionChanges, TransactionLocalUpdate,
    TransactionRepositoryTrait,
};
use florin_core::Result;

use super::model::TransactionDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::transactions;
use crate::utils::chunk_for_sqlite;
use async_trait::async_trait;

/// Repository for transaction rows, both feed-merged and user-edited.
pub struct TransactionRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl TransactionRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    /// Applies one page of feed deltas in a single transaction.
    ///
    /// Upserts run before removals so a posted record can still read alert
    /// bookkeeping off the provisional row it replaces when both arrive in
    /// the same page. Upserts rewrite feed-owned columns only; notes, tags,
    /// category overrides and alert state survive every re-sync.
    async fn merge(&self, account_id: &str, changes: TransactionChanges) -> Result<MergeOutcome> {
        let account_id_owned = account_id.to_string();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<MergeOutcome> {
                let mut outcome = MergeOutcome::default();

                for upsert in &changes.upserts {
                    let existing = transactions::table
                        .filter(transactions::account_id.eq(&account_id_owned))
                        .filter(transactions::external_id.eq(&upsert.external_id))
                        .select(TransactionDB::as_select())
                        .first::<TransactionDB>(conn)
                        .optional()
                        .map_err(StorageError::from)?;

                    match existing {
                        Some(current) if current.matches_upsert(upsert) => {
                            outcome.unchanged += 1;
                        }
                        Some(current) => {
                            let current_id = current.id.clone();

                            // Preserve fields the feed does not own
                            let TransactionDB {
                                notes,
                                tags,
                                category_override,
                                notified_at,
                                delivery_id,
                                created_at,
                                ..
                            } = current;

                            let mut changeset =
                                TransactionDB::from_upsert(&account_id_owned, upsert);
                            changeset.id = current_id;
                            changeset.notes = notes;
                            changeset.tags = tags;
                            changeset.category_override = category_override;
                            changeset.notified_at = notified_at;
                            changeset.delivery_id = delivery_id;
                            changeset.created_at = created_at;

                            diesel::update(transactions::table.find(&changeset.id))
                                .set(&changeset)
                                .execute(conn)
                                .map_err(StorageError::from)?;
                            outcome.updated += 1;
                        }
                        None => {
                            let mut row = TransactionDB::from_upsert(&account_id_owned, upsert);

                            // A record that supersedes a provisional one inherits
                            // its alert bookkeeping, so the same purchase never
                            // notifies twice across the pending-to-posted hop.
                            if let Some(pending_ref) = &upsert.pending_external_id {
                                let predecessor = transactions::table
                                    .filter(transactions::account_id.eq(&account_id_owned))
                                    .filter(transactions::external_id.eq(pending_ref))
                                    .select((transactions::notified_at, transactions::delivery_id))
                                    .first::<(Option<String>, Option<String>)>(conn)
                                    .optional()
                                    .map_err(StorageError::from)?;

                                if let Some((inherited_notified_at, inherited_delivery_id)) =
                                    predecessor
                                {
                                    row.notified_at = inherited_notified_at;
                                    row.delivery_id = inherited_delivery_id;
                                }
                            }

                            diesel::insert_into(transactions::table)
                                .values(&row)
                                .execute(conn)
                                .map_err(StorageError::from)?;
                            outcome.added += 1;
                        }
                    }
                }

                for chunk in chunk_for_sqlite(&changes.removed_external_ids) {
                    let deleted = diesel::delete(
                        transactions::table
                            .filter(transactions::account_id.eq(&account_id_owned))
                            .filter(transactions::external_id.eq_any(chunk)),
                    )
                    .execute(conn)
                    .map_err(StorageError::from)?;
                    outcome.removed += deleted;
                }

                debug!(
                    "Merged page for account {}: {} added, {} updated, {} unchanged, {} removed",
                    account_id_owned, outcome.added, outcome.updated, outcome.unchanged,
                    outcome.removed
                );

                Ok(outcome)
            })
            .await
    }

    async fn update_local(&self, update: TransactionLocalUpdate) -> Result<Transaction> {
        update.validate()?;
        let update_owned = update;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Transaction> {
                let tags_json = update_owned
                    .tags
                    .as_ref()
                    .map(|t| serde_json::to_string(t).unwrap_or_default());

                let updated_row = diesel::update(transactions::table.find(&update_owned.id))
                    .set((
                        transactions::notes.eq(&update_owned.notes),
                        transactions::tags.eq(tags_json),
                        transactions::category_override.eq(&update_owned.category_override),
                        transactions::updated_at.eq(Utc::now().to_rfc3339()),
                    ))
                    .get_result::<TransactionDB>(conn)
                    .map_err(StorageError::from)?;

                Ok(Transaction::from(updated_row))
            })
            .await
    }

    fn get_by_id(&self, transaction_id: &str) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;
        let row = transactions::table
            .find(transaction_id)
            .select(TransactionDB::as_select())
            .first::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(Transaction::from(row))
    }

    fn get_by_external_id(&self, account_id: &str, external_id: &str) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;
        let row = transactions::table
            .filter(transactions::account_id.eq(account_id))
            .filter(transactions::external_id.eq(external_id))
            .select(TransactionDB::as_select())
            .first::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(Transaction::from(row))
    }

    fn list_for_account(&self, account_id: &str) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = transactions::table
            .filter(transactions::account_id.eq(account_id))
            .order(transactions::posted_at.desc())
            .select(TransactionDB::as_select())
            .load::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Transaction::from).collect())
    }
}
