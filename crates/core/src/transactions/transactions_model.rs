//! Transaction domain models.
//!
//! Transactions mirror records owned by the upstream feed. Merge operations
//! only ever touch the feed-owned columns; fields the user sets locally
//! (notes, tags, category override) and alert bookkeeping survive every sync.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{errors::ValidationError, Error, Result};

/// Settlement status reported by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[default]
    Posted,
    Pending,
}

/// Domain model representing a bank transaction synced from the feed.
///
/// Amounts follow the feed's sign convention: positive is money leaving the
/// account, negative is money coming in.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Local identity (uuid), stable across feed updates.
    pub id: String,
    pub account_id: String,
    /// Provider identity, unique within an account.
    pub external_id: String,
    /// Provider id of the provisional (pending) record this one replaced.
    pub pending_external_id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    pub merchant: Option<String>,
    /// Category assigned by the feed.
    pub category: Option<String>,
    pub status: TransactionStatus,
    pub posted_at: DateTime<Utc>,
    /// Free-form note set by the user. Never touched by sync.
    pub notes: Option<String>,
    /// User labels. Never touched by sync.
    pub tags: Option<Vec<String>>,
    /// User category correction, wins over `category`. Never touched by sync.
    pub category_override: Option<String>,
    /// When the spending alert for this transaction was claimed.
    pub notified_at: Option<DateTime<Utc>>,
    /// Relay confirmation id, recorded after a successful delivery.
    pub delivery_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Whether money left the account.
    pub fn is_spend(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Category the user sees: their override when set, the feed's otherwise.
    pub fn effective_category(&self) -> Option<&str> {
        self.category_override
            .as_deref()
            .or(self.category.as_deref())
    }
}

/// Feed-owned fields of a transaction, as delivered by one sync page.
///
/// Applying the same upsert twice leaves the stored row unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpsert {
    pub external_id: String,
    pub pending_external_id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    pub merchant: Option<String>,
    pub category: Option<String>,
    pub status: TransactionStatus,
    pub posted_at: DateTime<Utc>,
}

impl TransactionUpsert {
    /// Validates a single feed record before it reaches storage.
    pub fn validate(&self) -> Result<()> {
        if self.external_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "externalId".to_string(),
            )));
        }
        if self.currency.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "currency".to_string(),
            )));
        }
        if let Some(pending_id) = &self.pending_external_id {
            if pending_id == &self.external_id {
                return Err(Error::Validation(ValidationError::InvalidInput(format!(
                    "Transaction '{}' references itself as its pending predecessor",
                    self.external_id
                ))));
            }
        }
        Ok(())
    }
}

/// One page of feed deltas, applied atomically by the repository.
#[derive(Debug, Clone, Default)]
pub struct TransactionChanges {
    pub upserts: Vec<TransactionUpsert>,
    pub removed_external_ids: Vec<String>,
}

impl TransactionChanges {
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.removed_external_ids.is_empty()
    }
}

/// Result of merging one page of feed changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    /// Number of transactions newly created
    pub added: usize,
    /// Number of existing transactions updated in place
    pub updated: usize,
    /// Number of upserts that matched the stored row exactly and were left
    /// untouched. Re-applying a page lands everything here.
    pub unchanged: usize,
    /// Number of transactions deleted by removal notices
    pub removed: usize,
    /// Number of records skipped as malformed
    pub skipped: usize,
}

/// User-edited fields of a transaction.
///
/// `None` clears the field; these columns belong to the user, not the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLocalUpdate {
    pub id: String,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category_override: Option<String>,
}

impl TransactionLocalUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Transaction ID is required for updates".to_string(),
            )));
        }
        Ok(())
    }
}
