//! Database models for accounts.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use florin_core::accounts::{Account, NewAccount};

use crate::schema::accounts;

/// Database model for accounts
#[derive(
    Debug, Clone, Queryable, Identifiable, Insertable, AsChangeset, Selectable, Serialize,
    Deserialize,
)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountDB {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub relay_address: Option<String>,
    pub alerts_enabled: bool,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl AccountDB {
    /// Build an insertable row from a validated NewAccount.
    pub fn from_new(new_account: NewAccount, id: String) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id,
            name: new_account.name,
            currency: new_account.currency,
            relay_address: new_account.relay_address,
            alerts_enabled: new_account.alerts_enabled,
            is_active: new_account.is_active,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

impl From<AccountDB> for Account {
    fn from(db: AccountDB) -> Self {
        Self {
            id: db.id,
            name: db.name,
            currency: db.currency,
            relay_address: db.relay_address,
            alerts_enabled: db.alerts_enabled,
            is_active: db.is_active,
            created_at: DateTime::parse_from_rfc3339(&db.created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            updated_at: DateTime::parse_from_rfc3339(&db.updated_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }
    }
}

impl From<Account> for AccountDB {
    fn from(domain: Account) -> Self {
        Self {
            id: domain.id,
            name: domain.name,
            currency: domain.currency,
            relay_address: domain.relay_address,
            alerts_enabled: domain.alerts_enabled,
            is_active: domain.is_active,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }
}
