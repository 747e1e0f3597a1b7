//! End-to-end sync tests against a real SQLite database.
//!
//! These wire the sync service to the actual repositories and services,
//! with only the feed and the relay scripted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::{tempdir, TempDir};

use florin_core::accounts::{AccountService, AccountServiceTrait, NewAccount};
use florin_core::alerts::{AlertRelay, AlertService};
use florin_core::errors::{Error, Result};
use florin_core::sync::{FeedSyncStateRepositoryTrait, SyncStatus};
use florin_core::transactions::{TransactionRepositoryTrait, TransactionService};
use florin_feed::{
    FeedClient, FeedPage, FeedSyncConfig, FeedSyncService, FeedSyncServiceTrait, FeedTransaction,
};
use florin_storage_sqlite::accounts::AccountRepository;
use florin_storage_sqlite::alerts::AlertRepository;
use florin_storage_sqlite::sync::FeedSyncStateRepository;
use florin_storage_sqlite::transactions::TransactionRepository;
use florin_storage_sqlite::{create_pool, run_migrations, spawn_writer};

// --- Scripted feed ---

#[derive(Default)]
struct ScriptedFeed {
    pages: Mutex<HashMap<Option<String>, FeedPage>>,
}

impl ScriptedFeed {
    fn add_page(&self, cursor: Option<&str>, page: FeedPage) {
        self.pages
            .lock()
            .unwrap()
            .insert(cursor.map(String::from), page);
    }
}

#[async_trait]
impl FeedClient for ScriptedFeed {
    async fn fetch_page(&self, _account_id: &str, cursor: Option<&str>) -> Result<FeedPage> {
        self.pages
            .lock()
            .unwrap()
            .get(&cursor.map(String::from))
            .cloned()
            .ok_or_else(|| Error::Feed(format!("No page at cursor {:?}", cursor)))
    }
}

// --- Recording relay ---

#[derive(Default)]
struct RecordingRelay {
    deliveries: Mutex<Vec<(String, String)>>,
}

impl RecordingRelay {
    fn deliveries(&self) -> Vec<(String, String)> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertRelay for RecordingRelay {
    async fn deliver(&self, recipient: &str, message: &str) -> Result<String> {
        let mut deliveries = self.deliveries.lock().unwrap();
        deliveries.push((recipient.to_string(), message.to_string()));
        Ok(format!("msg-{}", deliveries.len()))
    }
}

// --- Fixture ---

struct TestApp {
    service: FeedSyncService,
    feed: Arc<ScriptedFeed>,
    relay: Arc<RecordingRelay>,
    accounts: Arc<AccountService>,
    transactions: Arc<TransactionRepository>,
    sync_state: Arc<FeedSyncStateRepository>,
    _temp_dir: TempDir,
}

fn build_app() -> TestApp {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");
    let db_path_str = db_path.to_string_lossy().to_string();

    let pool = create_pool(&db_path_str).expect("Failed to create pool");
    run_migrations(&pool).expect("Failed to run migrations");
    let writer = spawn_writer(Arc::clone(&pool));

    let account_repo = Arc::new(AccountRepository::new(Arc::clone(&pool), writer.clone()));
    let transaction_repo = Arc::new(TransactionRepository::new(Arc::clone(&pool), writer.clone()));
    let alert_repo = Arc::new(AlertRepository::new(Arc::clone(&pool), writer.clone()));
    let sync_state = Arc::new(FeedSyncStateRepository::new(Arc::clone(&pool), writer));

    let feed = Arc::new(ScriptedFeed::default());
    let relay = Arc::new(RecordingRelay::default());

    let accounts = Arc::new(AccountService::new(account_repo));
    let transactions = Arc::new(TransactionService::new(transaction_repo.clone()));
    let alerts = Arc::new(AlertService::new(alert_repo, relay.clone()));

    let service = FeedSyncService::new(
        feed.clone(),
        accounts.clone(),
        transactions,
        alerts,
        sync_state.clone(),
        FeedSyncConfig::default(),
    );

    TestApp {
        service,
        feed,
        relay,
        accounts,
        transactions: transaction_repo,
        sync_state,
        _temp_dir: temp_dir,
    }
}

async fn create_account(app: &TestApp, alerts_enabled: bool) -> String {
    let account = app
        .accounts
        .create_account(NewAccount {
            id: Some("acct-1".to_string()),
            name: "Checking".to_string(),
            currency: "USD".to_string(),
            relay_address: alerts_enabled.then(|| "+15550100".to_string()),
            alerts_enabled,
            is_active: true,
        })
        .await
        .expect("Account should be created");
    account.id
}

fn record(external_id: &str, amount: &str) -> FeedTransaction {
    FeedTransaction {
        external_id: external_id.to_string(),
        amount: amount.to_string(),
        currency: "USD".to_string(),
        description: Some("COFFEE BAR 0042".to_string()),
        merchant: Some("Coffee Bar".to_string()),
        category: Some("Dining".to_string()),
        posted_at: "2026-07-01T12:00:00Z".to_string(),
        ..Default::default()
    }
}

fn page(added: Vec<FeedTransaction>, next_cursor: &str, has_more: bool) -> FeedPage {
    FeedPage {
        added,
        next_cursor: next_cursor.to_string(),
        has_more,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_sync_persists_pages_and_resumes_after_failure() {
    let app = build_app();
    let account_id = create_account(&app, false).await;

    // First run: the opening page merges, then the fetch at c1 fails.
    app.feed.add_page(
        None,
        page(
            vec![record("ext-1", "4.50"), record("ext-2", "12.00")],
            "c1",
            true,
        ),
    );

    let err = app
        .service
        .sync_account(&account_id)
        .await
        .expect_err("fetch at c1 should fail");
    assert!(matches!(err, Error::Feed(_)));

    let state = app
        .sync_state
        .get(&account_id)
        .expect("state should load")
        .expect("state should exist");
    assert_eq!(state.sync_status, SyncStatus::Failed);
    assert_eq!(
        state.cursor.as_deref(),
        Some("c1"),
        "the merged page stays behind the cursor"
    );
    let rows = app
        .transactions
        .list_for_account(&account_id)
        .expect("rows should load");
    assert_eq!(rows.len(), 2, "the merged page should survive the failed run");

    // Second run: the provider re-sends ext-2 unchanged alongside a new record.
    app.feed.add_page(
        Some("c1"),
        page(
            vec![record("ext-2", "12.00"), record("ext-3", "9.99")],
            "c2",
            false,
        ),
    );

    let summary = app
        .service
        .sync_account(&account_id)
        .await
        .expect("second run should succeed");
    assert_eq!(
        summary.pages, 1,
        "the run should resume at c1, not re-pull from the start"
    );
    assert_eq!(summary.added, 1);
    assert_eq!(
        summary.unchanged, 1,
        "the re-sent record should merge as a no-op"
    );

    let rows = app
        .transactions
        .list_for_account(&account_id)
        .expect("rows should load");
    assert_eq!(rows.len(), 3, "no duplicates from the overlapping page");

    let state = app
        .sync_state
        .get(&account_id)
        .expect("state should load")
        .expect("state should exist");
    assert_eq!(state.sync_status, SyncStatus::Idle);
    assert_eq!(state.cursor.as_deref(), Some("c2"));
}

#[tokio::test]
async fn test_alerts_fire_once_across_runs() {
    let app = build_app();
    let account_id = create_account(&app, true).await;

    app.feed
        .add_page(None, page(vec![record("ext-1", "45.00")], "c1", false));

    let summary = app
        .service
        .sync_account(&account_id)
        .await
        .expect("sync should succeed");
    assert_eq!(summary.alerts.eligible, 1);
    assert_eq!(summary.alerts.delivered, 1);

    let deliveries = app.relay.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].0, "+15550100");
    assert!(
        deliveries[0].1.contains("Coffee Bar"),
        "message should name the merchant: {}",
        deliveries[0].1
    );

    let row = app
        .transactions
        .get_by_external_id(&account_id, "ext-1")
        .expect("row should exist");
    assert!(row.notified_at.is_some());
    assert_eq!(row.delivery_id.as_deref(), Some("msg-1"));

    // A later run that re-delivers the same record sends nothing new.
    app.feed
        .add_page(Some("c1"), page(vec![record("ext-1", "45.00")], "c2", false));
    let summary = app
        .service
        .sync_account(&account_id)
        .await
        .expect("second sync should succeed");
    assert_eq!(summary.alerts.eligible, 0);
    assert_eq!(summary.alerts.delivered, 0);
    assert_eq!(app.relay.deliveries().len(), 1, "the alert must not repeat");
}

#[tokio::test]
async fn test_pending_to_posted_does_not_realert() {
    let app = build_app();
    let account_id = create_account(&app, true).await;

    // First run discovers and alerts the pending record.
    let mut pending = record("ext-p1", "30.00");
    pending.status = Some("PENDING".to_string());
    app.feed.add_page(None, page(vec![pending], "c1", false));

    let summary = app
        .service
        .sync_account(&account_id)
        .await
        .expect("first sync should succeed");
    assert_eq!(summary.alerts.delivered, 1);

    // Second run: the posted record replaces the pending one.
    let mut posted = record("ext-1", "30.00");
    posted.pending_external_id = Some("ext-p1".to_string());
    let mut second = page(vec![posted], "c2", false);
    second.removed = vec!["ext-p1".to_string()];
    app.feed.add_page(Some("c1"), second);

    let summary = app
        .service
        .sync_account(&account_id)
        .await
        .expect("second sync should succeed");

    assert_eq!(
        summary.alerts.eligible, 0,
        "the posted record inherits the pending record's claim"
    );
    assert_eq!(summary.alerts.delivered, 0);
    assert_eq!(app.relay.deliveries().len(), 1);

    let row = app
        .transactions
        .get_by_external_id(&account_id, "ext-1")
        .expect("posted row should exist");
    assert!(row.notified_at.is_some());
    assert_eq!(row.delivery_id.as_deref(), Some("msg-1"));
    assert!(
        app.transactions
            .get_by_external_id(&account_id, "ext-p1")
            .is_err(),
        "pending row should be gone"
    );
}
