pub mod model;
pub mod repository;

pub use model::FeedSyncStateDB;
pub use repository::FeedSyncStateRepository;
