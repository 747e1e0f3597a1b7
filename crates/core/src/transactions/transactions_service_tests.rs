#[cfg(test)]
mod tests {
    use crate::transactions::transactions_model::*;
    use crate::transactions::{
        TransactionRepositoryTrait, TransactionService, TransactionServiceTrait,
    };
    use crate::errors::Result;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex};

    // --- Mock TransactionRepository ---
    #[derive(Clone)]
    struct MockTransactionRepository {
        merged_pages: Arc<Mutex<Vec<(String, TransactionChanges)>>>,
    }

    impl MockTransactionRepository {
        fn new() -> Self {
            Self {
                merged_pages: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn merged_pages(&self) -> Vec<(String, TransactionChanges)> {
            self.merged_pages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TransactionRepositoryTrait for MockTransactionRepository {
        async fn merge(
            &self,
            account_id: &str,
            changes: TransactionChanges,
        ) -> Result<MergeOutcome> {
            let outcome = MergeOutcome {
                added: changes.upserts.len(),
                removed: changes.removed_external_ids.len(),
                ..Default::default()
            };
            self.merged_pages
                .lock()
                .unwrap()
                .push((account_id.to_string(), changes));
            Ok(outcome)
        }

        async fn update_local(&self, _update: TransactionLocalUpdate) -> Result<Transaction> {
            unimplemented!()
        }

        fn get_by_id(&self, _transaction_id: &str) -> Result<Transaction> {
            unimplemented!()
        }

        fn get_by_external_id(
            &self,
            _account_id: &str,
            _external_id: &str,
        ) -> Result<Transaction> {
            unimplemented!()
        }

        fn list_for_account(&self, _account_id: &str) -> Result<Vec<Transaction>> {
            unimplemented!()
        }
    }

    fn coffee_upsert(external_id: &str) -> TransactionUpsert {
        TransactionUpsert {
            external_id: external_id.to_string(),
            pending_external_id: None,
            amount: dec!(4.50),
            currency: "USD".to_string(),
            description: "Corner Coffee".to_string(),
            merchant: Some("Corner Coffee".to_string()),
            category: Some("FOOD_AND_DRINK".to_string()),
            status: TransactionStatus::Posted,
            posted_at: Utc::now(),
        }
    }

    // ============================================================================
    // apply_changes validation screening
    // ============================================================================

    #[tokio::test]
    async fn test_apply_changes_passes_clean_page_through() {
        let repository = Arc::new(MockTransactionRepository::new());
        let service = TransactionService::new(repository.clone());

        let changes = TransactionChanges {
            upserts: vec![coffee_upsert("ext-1"), coffee_upsert("ext-2")],
            removed_external_ids: vec!["ext-gone".to_string()],
        };

        let outcome = service.apply_changes("acc-1", changes).await.unwrap();

        assert_eq!(outcome.added, 2);
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.skipped, 0);

        let pages = repository.merged_pages();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].0, "acc-1");
        assert_eq!(pages[0].1.upserts.len(), 2);
    }

    #[tokio::test]
    async fn test_apply_changes_skips_malformed_without_aborting_siblings() {
        let repository = Arc::new(MockTransactionRepository::new());
        let service = TransactionService::new(repository.clone());

        let mut missing_external_id = coffee_upsert("");
        missing_external_id.external_id = "".to_string();

        let mut self_referencing = coffee_upsert("ext-3");
        self_referencing.pending_external_id = Some("ext-3".to_string());

        let changes = TransactionChanges {
            upserts: vec![
                coffee_upsert("ext-1"),
                missing_external_id,
                self_referencing,
                coffee_upsert("ext-2"),
            ],
            removed_external_ids: vec!["".to_string(), "ext-gone".to_string()],
        };

        let outcome = service.apply_changes("acc-1", changes).await.unwrap();

        // Two malformed upserts and one blank removal dropped; the rest merged.
        assert_eq!(outcome.skipped, 3);
        assert_eq!(outcome.added, 2);
        assert_eq!(outcome.removed, 1);

        let pages = repository.merged_pages();
        let merged = &pages[0].1;
        let ids: Vec<&str> = merged.upserts.iter().map(|u| u.external_id.as_str()).collect();
        assert_eq!(ids, vec!["ext-1", "ext-2"]);
        assert_eq!(merged.removed_external_ids, vec!["ext-gone".to_string()]);
    }

    #[tokio::test]
    async fn test_apply_changes_all_malformed_never_reaches_storage() {
        let repository = Arc::new(MockTransactionRepository::new());
        let service = TransactionService::new(repository.clone());

        let mut bad = coffee_upsert("ext-1");
        bad.currency = "".to_string();

        let changes = TransactionChanges {
            upserts: vec![bad],
            removed_external_ids: vec![],
        };

        let outcome = service.apply_changes("acc-1", changes).await.unwrap();

        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.added, 0);
        assert!(repository.merged_pages().is_empty());
    }

    #[tokio::test]
    async fn test_update_local_fields_requires_id() {
        let repository = Arc::new(MockTransactionRepository::new());
        let service = TransactionService::new(repository);

        let update = TransactionLocalUpdate {
            id: "".to_string(),
            notes: Some("split with roommate".to_string()),
            tags: None,
            category_override: None,
        };

        assert!(service.update_local_fields(update).await.is_err());
    }
}
