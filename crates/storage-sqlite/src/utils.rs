//! Utility functions for SQLite storage operations.

/// Maximum number of parameters for SQLite `IN (...)` queries.
///
/// SQLite caps the number of bound parameters per statement (historically
/// 999). Queries binding a caller-sized id list go through
/// `chunk_for_sqlite` so the cap is never hit, with headroom left for the
/// query's other parameters.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Chunk a slice into pieces small enough for one `IN (...)` clause.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}
