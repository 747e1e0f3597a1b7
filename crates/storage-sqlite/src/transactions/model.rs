//! Database models for transactions.
//!
//! Amounts and timestamps are stored as TEXT (decimal string / RFC3339) and
//! converted at the boundary; enum columns round-trip through their serde
//! names.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use florin_core::transactions::{Transaction, TransactionStatus, TransactionUpsert};

use crate::schema::transactions;

/// Database model for transactions
#[derive(
    Debug, Clone, Queryable, Identifiable, Insertable, AsChangeset, Selectable, Serialize,
    Deserialize,
)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub account_id: String,
    pub external_id: String,
    pub pending_external_id: Option<String>,
    pub amount: String,
    pub currency: String,
    pub description: String,
    pub merchant: Option<String>,
    pub category: Option<String>,
    pub status: String,
    pub posted_at: String,
    pub notes: Option<String>,
    pub tags: Option<String>,
    pub category_override: Option<String>,
    pub notified_at: Option<String>,
    pub delivery_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Serialize a status enum to its stored column form.
pub fn status_to_db(status: TransactionStatus) -> String {
    serde_json::to_string(&status)
        .unwrap_or_default()
        .trim_matches('"')
        .to_string()
}

/// Parse a stored status column, defaulting on unknown values.
pub fn status_from_db(status: &str) -> TransactionStatus {
    serde_json::from_str(&format!("\"{}\"", status)).unwrap_or_default()
}

impl TransactionDB {
    /// Whether every feed-owned column already holds the upsert's value.
    ///
    /// Amount and timestamp are compared as values, not strings, so scale
    /// and offset spellings of the same quantity count as equal.
    pub fn matches_upsert(&self, upsert: &TransactionUpsert) -> bool {
        let stored_amount = Decimal::from_str(&self.amount).unwrap_or_default();
        let stored_posted_at = DateTime::parse_from_rfc3339(&self.posted_at)
            .map(|dt| dt.with_timezone(&Utc))
            .ok();

        self.pending_external_id == upsert.pending_external_id
            && stored_amount == upsert.amount
            && self.currency == upsert.currency
            && self.description == upsert.description
            && self.merchant == upsert.merchant
            && self.category == upsert.category
            && self.status == status_to_db(upsert.status)
            && stored_posted_at == Some(upsert.posted_at)
    }

    /// Builds a fresh row for a feed record never seen before.
    ///
    /// Local columns start empty; alert bookkeeping is filled in by the
    /// caller when the record supersedes a provisional row.
    pub fn from_upsert(account_id: &str, upsert: &TransactionUpsert) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            external_id: upsert.external_id.clone(),
            pending_external_id: upsert.pending_external_id.clone(),
            amount: upsert.amount.to_string(),
            currency: upsert.currency.clone(),
            description: upsert.description.clone(),
            merchant: upsert.merchant.clone(),
            category: upsert.category.clone(),
            status: status_to_db(upsert.status),
            posted_at: upsert.posted_at.to_rfc3339(),
            notes: None,
            tags: None,
            category_override: None,
            notified_at: None,
            delivery_id: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

impl From<TransactionDB> for Transaction {
    fn from(db: TransactionDB) -> Self {
        Self {
            id: db.id,
            account_id: db.account_id,
            external_id: db.external_id,
            pending_external_id: db.pending_external_id,
            amount: Decimal::from_str(&db.amount).unwrap_or_default(),
            currency: db.currency,
            description: db.description,
            merchant: db.merchant,
            category: db.category,
            status: status_from_db(&db.status),
            posted_at: DateTime::parse_from_rfc3339(&db.posted_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            notes: db.notes,
            tags: db.tags.and_then(|s| serde_json::from_str(&s).ok()),
            category_override: db.category_override,
            notified_at: db.notified_at.and_then(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
            delivery_id: db.delivery_id,
            created_at: DateTime::parse_from_rfc3339(&db.created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            updated_at: DateTime::parse_from_rfc3339(&db.updated_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }
    }
}

impl From<Transaction> for TransactionDB {
    fn from(domain: Transaction) -> Self {
        Self {
            id: domain.id,
            account_id: domain.account_id,
            external_id: domain.external_id,
            pending_external_id: domain.pending_external_id,
            amount: domain.amount.to_string(),
            currency: domain.currency,
            description: domain.description,
            merchant: domain.merchant,
            category: domain.category,
            status: status_to_db(domain.status),
            posted_at: domain.posted_at.to_rfc3339(),
            notes: domain.notes,
            tags: domain
                .tags
                .map(|t| serde_json::to_string(&t).unwrap_or_default()),
            category_override: domain.category_override,
            notified_at: domain.notified_at.map(|dt| dt.to_rfc3339()),
            delivery_id: domain.delivery_id,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }
}
