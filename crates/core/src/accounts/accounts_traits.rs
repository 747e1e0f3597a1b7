//! Account repository and service traits.
//!
//! These traits define the contract for account operations without any
//! database-specific types, allowing for different storage implementations.

use async_trait::async_trait;

use super::accounts_model::{Account, AccountUpdate, NewAccount};
use crate::errors::Result;

/// Trait defining the contract for Account repository operations.
///
/// Implementations of this trait handle the persistence of account data.
/// The trait is database-agnostic - storage-specific details are handled
/// by concrete implementations.
#[async_trait]
pub trait AccountRepositoryTrait: Send + Sync {
    /// Creates a new account.
    async fn create(&self, new_account: NewAccount) -> Result<Account>;

    /// Updates an existing account.
    async fn update(&self, account_update: AccountUpdate) -> Result<Account>;

    /// Retrieves an account by its ID.
    fn get_by_id(&self, account_id: &str) -> Result<Account>;

    /// Lists accounts, optionally filtered by active status.
    fn list(&self, is_active_filter: Option<bool>) -> Result<Vec<Account>>;
}

/// Trait defining the contract for Account service operations.
#[async_trait]
pub trait AccountServiceTrait: Send + Sync {
    /// Creates a new account with business validation.
    async fn create_account(&self, new_account: NewAccount) -> Result<Account>;

    /// Updates an existing account with business validation.
    async fn update_account(&self, account_update: AccountUpdate) -> Result<Account>;

    /// Retrieves an account by ID.
    fn get_account(&self, account_id: &str) -> Result<Account>;

    /// Gets all accounts regardless of status.
    fn get_all_accounts(&self) -> Result<Vec<Account>>;

    /// Gets only active accounts.
    fn get_active_accounts(&self) -> Result<Vec<Account>>;
}
