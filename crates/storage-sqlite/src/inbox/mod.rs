pub mod model;
pub mod repository;

pub use model::InboundMessageDB;
pub use repository::InboxRepository;
