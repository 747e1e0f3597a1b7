//! Conversion of raw feed records into domain merge input.
//!
//! The feed is stringly typed; this module is where amounts, timestamps and
//! statuses become real types. A record that fails conversion is dropped
//! and counted, never allowed to abort its page.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::warn;
use rust_decimal::Decimal;

use florin_core::transactions::{TransactionChanges, TransactionStatus, TransactionUpsert};
use florin_core::Result;

use super::models::{FeedPage, FeedTransaction};

/// Converts one feed page into merge input.
///
/// Returns the changes plus the number of records skipped as malformed.
pub fn to_changes(page: &FeedPage) -> (TransactionChanges, usize) {
    let mut changes = TransactionChanges::default();
    let mut skipped = 0;

    for record in page.added.iter().chain(page.modified.iter()) {
        match to_upsert(record) {
            Ok(upsert) => changes.upserts.push(upsert),
            Err(err) => {
                warn!(
                    "Skipping malformed feed record '{}': {}",
                    record.external_id, err
                );
                skipped += 1;
            }
        }
    }

    changes.removed_external_ids = page.removed.clone();

    (changes, skipped)
}

/// Converts a single raw record into a validated upsert.
pub fn to_upsert(record: &FeedTransaction) -> Result<TransactionUpsert> {
    let amount = Decimal::from_str(record.amount.trim())?;
    let posted_at = DateTime::parse_from_rfc3339(&record.posted_at)?.with_timezone(&Utc);

    let upsert = TransactionUpsert {
        external_id: record.external_id.clone(),
        pending_external_id: record.pending_external_id.clone(),
        amount,
        currency: record.currency.clone(),
        description: record.description.clone().unwrap_or_default(),
        merchant: record.merchant.clone(),
        category: record.category.clone(),
        status: parse_status(record.status.as_deref()),
        posted_at,
    };
    upsert.validate()?;
    Ok(upsert)
}

fn parse_status(status: Option<&str>) -> TransactionStatus {
    match status {
        Some(s) if s.eq_ignore_ascii_case("PENDING") => TransactionStatus::Pending,
        _ => TransactionStatus::Posted,
    }
}
