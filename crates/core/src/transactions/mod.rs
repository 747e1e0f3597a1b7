//! Transactions module - domain models, services, and traits.

mod transactions_model;
mod transactions_service;
mod transactions_traits;


#[cfg(test)]
mod transactions_service_tests;

pub use transactions_model::{
    MergeOutcome, Transaction, TransactionChanges, TransactionLocalUpdate, TransactionStatus,
    TransactionUpsert,
};
pub use transactions_service::TransactionService;
pub use transactions_traits::{TransactionRepositoryTrait, TransactionServiceTrait};
