//! Sync domain models and traits.

mod sync_state_model;
mod sync_traits;

pub use sync_state_model::*;
pub use sync_traits::FeedSyncStateRepositoryTrait;

#[cfg(test)]
mod tests;
