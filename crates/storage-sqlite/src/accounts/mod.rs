//! Account storage module.

mod model;
mod repository;

pub use model::AccountDB;
pub use repository::AccountRepository;
