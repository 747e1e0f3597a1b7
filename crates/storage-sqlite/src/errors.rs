//! Error bridging between Diesel and the core error types.
//!
//! Repositories work in `StorageError` while a statement is in flight and
//! hand `florin_core::Error` back at the trait boundary. The diesel `Error`
//! cases that callers branch on (missing row, constraint hits) map to
//! dedicated `DatabaseError` variants; everything else collapses to strings.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use florin_core::errors::{DatabaseError, Error};
use thiserror::Error;

/// Internal error for the storage layer.
///
/// Also the error type of the write actor's transaction wrapper, which is
/// why core errors fold into it and back out again.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Core error: {0}")]
    CoreError(String),
}

// Lets write-actor jobs return core errors through the StorageError-typed
// transaction closure.
impl From<Error> for StorageError {
    fn from(err: Error) -> Self {
        StorageError::CoreError(err.to_string())
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        let db_err = match err {
            StorageError::PoolError(e) => DatabaseError::PoolCreationFailed(e.to_string()),
            StorageError::QueryFailed(DieselError::NotFound) => {
                DatabaseError::NotFound("Record not found".to_string())
            }
            StorageError::QueryFailed(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                info,
            )) => DatabaseError::UniqueViolation(info.message().to_string()),
            StorageError::QueryFailed(DieselError::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation,
                info,
            )) => DatabaseError::ForeignKeyViolation(info.message().to_string()),
            StorageError::QueryFailed(e) => DatabaseError::QueryFailed(e.to_string()),
            StorageError::CoreError(e) => DatabaseError::Internal(e),
        };
        Error::Database(db_err)
    }
}

/// Converts diesel/r2d2 results straight to core results.
///
/// Orphan rules block `From<DieselError> for Error`, so read paths call
/// `.into_core()` instead.
pub trait IntoCore<T> {
    fn into_core(self) -> florin_core::Result<T>;
}

impl<T> IntoCore<T> for std::result::Result<T, DieselError> {
    fn into_core(self) -> florin_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

impl<T> IntoCore<T> for std::result::Result<T, r2d2::Error> {
    fn into_core(self) -> florin_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}
