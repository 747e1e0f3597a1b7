//! Repository for account persistence.

use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use florin_core::accounts::{Account, AccountRepositoryTrait, AccountUpdate, NewAccount};
use florin_core::Result;

use super::model::AccountDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::accounts;
use async_trait::async_trait;

/// Repository for managing account data in the database
pub struct AccountRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl AccountRepository {
    /// Creates a new AccountRepository instance
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl AccountRepositoryTrait for AccountRepository {
    async fn create(&self, new_account: NewAccount) -> Result<Account> {
        let id = new_account
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let row = AccountDB::from_new(new_account, id);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Account> {
                let inserted = diesel::insert_into(accounts::table)
                    .values(&row)
                    .get_result::<AccountDB>(conn)
                    .map_err(StorageError::from)?;
                Ok(Account::from(inserted))
            })
            .await
    }

    async fn update(&self, account_update: AccountUpdate) -> Result<Account> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Account> {
                let updated = diesel::update(accounts::table.find(&account_update.id))
                    .set((
                        accounts::name.eq(&account_update.name),
                        accounts::relay_address.eq(&account_update.relay_address),
                        accounts::alerts_enabled.eq(account_update.alerts_enabled),
                        accounts::is_active.eq(account_update.is_active),
                        accounts::updated_at.eq(Utc::now().to_rfc3339()),
                    ))
                    .get_result::<AccountDB>(conn)
                    .map_err(StorageError::from)?;
                Ok(Account::from(updated))
            })
            .await
    }

    fn get_by_id(&self, account_id: &str) -> Result<Account> {
        let mut conn = get_connection(&self.pool)?;
        let account_db = accounts::table
            .select(AccountDB::as_select())
            .find(account_id)
            .first::<AccountDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(Account::from(account_db))
    }

    fn list(&self, is_active_filter: Option<bool>) -> Result<Vec<Account>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = accounts::table.into_boxed();
        if let Some(is_active) = is_active_filter {
            query = query.filter(accounts::is_active.eq(is_active));
        }

        let accounts_db = query
            .select(AccountDB::as_select())
            .order(accounts::name.asc())
            .load::<AccountDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(accounts_db.into_iter().map(Account::from).collect())
    }
}
