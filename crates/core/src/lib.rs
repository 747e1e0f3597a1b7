//! Florin Core - Domain entities, services, and traits.
//!
//! This crate contains the core business logic for Florin.
//! It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate.

pub mod accounts;
pub mod alerts;
pub mod errors;
pub mod inbox;
pub mod sync;
pub mod transactions;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
