use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use florin_core::alerts::AlertRepositoryTrait;
use florin_core::transactions::Transaction;
use florin_core::Result;

use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::transactions;
use crate::transactions::TransactionDB;
use async_trait::async_trait;

/// Repository for alert claim bookkeeping on transaction rows.
///
/// The claim itself is one conditional UPDATE; the row's `notified_at`
/// column doubles as the lock, so there is nothing to clean up if a
/// worker dies after winning.
pub struct AlertRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl AlertRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl AlertRepositoryTrait for AlertRepository {
    async fn try_claim(&self, transaction_id: &str) -> Result<bool> {
        let transaction_id_owned = transaction_id.to_string();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<bool> {
                let now = Utc::now().to_rfc3339();
                let claimed = diesel::update(
                    transactions::table
                        .find(&transaction_id_owned)
                        .filter(transactions::notified_at.is_null()),
                )
                .set((
                    transactions::notified_at.eq(&now),
                    transactions::updated_at.eq(&now),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;

                Ok(claimed == 1)
            })
            .await
    }

    async fn confirm(&self, transaction_id: &str, delivery_id: &str) -> Result<()> {
        let transaction_id_owned = transaction_id.to_string();
        let delivery_id_owned = delivery_id.to_string();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::update(transactions::table.find(&transaction_id_owned))
                    .set((
                        transactions::delivery_id.eq(&delivery_id_owned),
                        transactions::updated_at.eq(Utc::now().to_rfc3339()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn release(&self, transaction_id: &str) -> Result<()> {
        let transaction_id_owned = transaction_id.to_string();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::update(transactions::table.find(&transaction_id_owned))
                    .set((
                        transactions::notified_at.eq(None::<String>),
                        transactions::delivery_id.eq(None::<String>),
                        transactions::updated_at.eq(Utc::now().to_rfc3339()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    fn list_alertable(&self, account_id: &str) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = transactions::table
            .filter(transactions::account_id.eq(account_id))
            .filter(transactions::notified_at.is_null())
            .order(transactions::posted_at.asc())
            .select(TransactionDB::as_select())
            .load::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;

        // Amounts live in a TEXT column, so the spend check happens here
        // rather than in SQL.
        Ok(rows
            .into_iter()
            .map(Transaction::from)
            .filter(|transaction| transaction.is_spend())
            .collect())
    }

    fn count_unconfirmed(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let count = transactions::table
            .filter(transactions::notified_at.is_not_null())
            .filter(transactions::delivery_id.is_null())
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, get_connection, run_migrations, spawn_writer};
    use chrono::{DateTime, Duration};
    use tempfile::tempdir;
    use uuid::Uuid;

    async fn create_test_repository() -> (
        AlertRepository,
        Arc<Pool<ConnectionManager<SqliteConnection>>>,
        tempfile::TempDir,
    ) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let db_path_str = db_path.to_string_lossy().to_string();

        let pool = create_pool(&db_path_str).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");

        let writer = spawn_writer(Arc::clone(&pool));
        let repo = AlertRepository::new(Arc::clone(&pool), writer);
        (repo, pool, temp_dir)
    }

    fn create_test_account(
        pool: &Arc<Pool<ConnectionManager<SqliteConnection>>>,
        account_id: &str,
    ) {
        let mut conn = get_connection(pool).expect("Failed to get connection");
        diesel::sql_query(format!(
            "INSERT INTO accounts (id, name, currency, relay_address, alerts_enabled, is_active, created_at, updated_at) \
             VALUES ('{}', 'Test Account', 'USD', '+15550100', true, true, datetime('now'), datetime('now'))",
            account_id
        ))
        .execute(&mut conn)
        .expect("Failed to create test account");
    }

    /// Inserts a transaction row directly; `amount` is the stored TEXT form.
    fn insert_test_transaction(
        pool: &Arc<Pool<ConnectionManager<SqliteConnection>>>,
        account_id: &str,
        external_id: &str,
        amount: &str,
        posted_at: DateTime<Utc>,
    ) -> String {
        let now = Utc::now().to_rfc3339();
        let row = TransactionDB {
            id: Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            external_id: external_id.to_string(),
            pending_external_id: None,
            amount: amount.to_string(),
            currency: "USD".to_string(),
            description: "TEST PURCHASE".to_string(),
            merchant: None,
            category: None,
            status: "POSTED".to_string(),
            posted_at: posted_at.to_rfc3339(),
            notes: None,
            tags: None,
            category_override: None,
            notified_at: None,
            delivery_id: None,
            created_at: now.clone(),
            updated_at: now,
        };

        let mut conn = get_connection(pool).expect("Failed to get connection");
        diesel::insert_into(transactions::table)
            .values(&row)
            .execute(&mut conn)
            .expect("Failed to insert test transaction");
        row.id
    }

    fn alert_columns(
        pool: &Arc<Pool<ConnectionManager<SqliteConnection>>>,
        transaction_id: &str,
    ) -> (Option<String>, Option<String>) {
        let mut conn = get_connection(pool).expect("Failed to get connection");
        transactions::table
            .find(transaction_id)
            .select((transactions::notified_at, transactions::delivery_id))
            .first(&mut conn)
            .expect("Failed to read alert columns")
    }

    // ========================================================================
    // Claim Tests
    // ========================================================================

    #[tokio::test]
    async fn test_try_claim_only_first_caller_wins() {
        let (repo, pool, _temp_dir) = create_test_repository().await;
        create_test_account(&pool, "acc-1");
        let tx_id = insert_test_transaction(&pool, "acc-1", "ext-1", "25.00", Utc::now());

        assert!(repo.try_claim(&tx_id).await.expect("Failed first claim"));
        assert!(!repo.try_claim(&tx_id).await.expect("Failed second claim"));

        let (notified_at, delivery_id) = alert_columns(&pool, &tx_id);
        assert!(notified_at.is_some());
        assert!(delivery_id.is_none(), "claim alone records no delivery");
    }

    #[tokio::test]
    async fn test_concurrent_claims_have_single_winner() {
        let (repo, pool, _temp_dir) = create_test_repository().await;
        create_test_account(&pool, "acc-1");
        let tx_id = insert_test_transaction(&pool, "acc-1", "ext-1", "25.00", Utc::now());

        let repo = Arc::new(repo);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = Arc::clone(&repo);
            let tx_id = tx_id.clone();
            handles.push(tokio::spawn(
                async move { repo.try_claim(&tx_id).await.expect("Failed to claim") },
            ));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.expect("claim task panicked") {
                wins += 1;
            }
        }
        assert_eq!(wins, 1, "exactly one racing claimer may win");
    }

    #[tokio::test]
    async fn test_release_reopens_the_claim() {
        let (repo, pool, _temp_dir) = create_test_repository().await;
        create_test_account(&pool, "acc-1");
        let tx_id = insert_test_transaction(&pool, "acc-1", "ext-1", "25.00", Utc::now());

        assert!(repo.try_claim(&tx_id).await.expect("Failed to claim"));
        repo.release(&tx_id).await.expect("Failed to release");

        let (notified_at, delivery_id) = alert_columns(&pool, &tx_id);
        assert!(notified_at.is_none());
        assert!(delivery_id.is_none());

        // A later pass can claim again.
        assert!(repo.try_claim(&tx_id).await.expect("Failed to re-claim"));
    }

    #[tokio::test]
    async fn test_confirm_records_delivery() {
        let (repo, pool, _temp_dir) = create_test_repository().await;
        create_test_account(&pool, "acc-1");
        let tx_id = insert_test_transaction(&pool, "acc-1", "ext-1", "25.00", Utc::now());

        assert!(repo.try_claim(&tx_id).await.expect("Failed to claim"));
        assert_eq!(repo.count_unconfirmed().expect("Failed to count"), 1);

        repo.confirm(&tx_id, "relay-msg-42")
            .await
            .expect("Failed to confirm");

        let (_, delivery_id) = alert_columns(&pool, &tx_id);
        assert_eq!(delivery_id.as_deref(), Some("relay-msg-42"));
        assert_eq!(repo.count_unconfirmed().expect("Failed to count"), 0);
    }

    #[tokio::test]
    async fn test_count_unconfirmed_spans_accounts() {
        let (repo, pool, _temp_dir) = create_test_repository().await;
        create_test_account(&pool, "acc-1");
        create_test_account(&pool, "acc-2");
        let first = insert_test_transaction(&pool, "acc-1", "ext-1", "10.00", Utc::now());
        let second = insert_test_transaction(&pool, "acc-2", "ext-1", "20.00", Utc::now());

        assert!(repo.try_claim(&first).await.expect("Failed to claim"));
        assert!(repo.try_claim(&second).await.expect("Failed to claim"));

        assert_eq!(repo.count_unconfirmed().expect("Failed to count"), 2);
    }

    // ========================================================================
    // Eligibility Tests
    // ========================================================================

    #[tokio::test]
    async fn test_list_alertable_filters_and_orders() {
        let (repo, pool, _temp_dir) = create_test_repository().await;
        create_test_account(&pool, "acc-1");
        let now = Utc::now();

        let older_spend =
            insert_test_transaction(&pool, "acc-1", "spend-old", "10.00", now - Duration::hours(2));
        let newer_spend =
            insert_test_transaction(&pool, "acc-1", "spend-new", "5.00", now - Duration::hours(1));
        // Money coming in never alerts.
        insert_test_transaction(&pool, "acc-1", "refund", "-20.00", now - Duration::hours(3));
        // Already-claimed spends are done.
        let claimed =
            insert_test_transaction(&pool, "acc-1", "claimed", "7.00", now - Duration::hours(4));
        assert!(repo.try_claim(&claimed).await.expect("Failed to claim"));

        let eligible = repo
            .list_alertable("acc-1")
            .expect("Failed to list alertable");

        let ids: Vec<&str> = eligible.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![older_spend.as_str(), newer_spend.as_str()]);
    }

    #[tokio::test]
    async fn test_list_alertable_is_scoped_to_account() {
        let (repo, pool, _temp_dir) = create_test_repository().await;
        create_test_account(&pool, "acc-1");
        create_test_account(&pool, "acc-2");
        insert_test_transaction(&pool, "acc-1", "ext-1", "10.00", Utc::now());
        insert_test_transaction(&pool, "acc-2", "ext-1", "20.00", Utc::now());

        let eligible = repo
            .list_alertable("acc-1")
            .expect("Failed to list alertable");
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].account_id, "acc-1");
    }
}
