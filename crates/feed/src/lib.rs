//! Florin Feed - transaction feed synchronization.
//!
//! This crate pulls pages of bank transaction deltas from the upstream
//! feed provider and merges them into local storage through the
//! `florin-core` service traits. It owns the pagination/cursor protocol
//! and the post-sync alert pass; it never touches the database directly.

pub mod mapping;
pub mod models;
pub mod service;
pub mod traits;


// Re-export commonly used types
pub use models::{FeedPage, FeedSyncConfig, FeedSyncSummary, FeedTransaction, SyncAllOutcome};
pub use service::FeedSyncService;
pub use traits::{FeedClient, FeedSyncServiceTrait};
