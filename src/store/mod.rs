//! Storage-level failures shared by every repository adapter.

mod memory;

pub use memory::MemoryStore;

use sqlx::error::ErrorKind;

/// Failures raised by the persistence gateway.
///
/// Constraint violations are split out so services can turn them into
/// named failures; anything else stays opaque.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    UniqueViolation,
    #[error("foreign key constraint violated")]
    ForeignKeyViolation,
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let kind = err.as_database_error().map(|db| db.kind());
        match kind {
            Some(ErrorKind::UniqueViolation) => StoreError::UniqueViolation,
            Some(ErrorKind::ForeignKeyViolation) => StoreError::ForeignKeyViolation,
            _ => StoreError::Database(err),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_stay_opaque() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn pool_errors_stay_opaque() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Database(_)));
        assert!(err.to_string().starts_with("database error"));
    }
}
