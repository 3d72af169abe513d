//! Application error types for core storage and domain logic.
use thiserror::Error;

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    StorageMessage(String),
}

impl AppError {
    /// Whether this error originates from the backing store rather than input.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Io(_)
                | Self::Serialization(_)
                | Self::Json(_)
                | Self::StorageMessage(_)
        )
    }

    pub(crate) fn poisoned(collection: &str) -> Self {
        Self::StorageMessage(format!("{} collection lock is poisoned", collection))
    }
}

impl From<redb::DatabaseError> for AppError {
    fn from(value: redb::DatabaseError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TransactionError> for AppError {
    fn from(value: redb::TransactionError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TableError> for AppError {
    fn from(value: redb::TableError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::StorageError> for AppError {
    fn from(value: redb::StorageError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::CommitError> for AppError {
    fn from(value: redb::CommitError) -> Self {
        Self::Database(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn persistence_family_is_classified() {
        assert!(AppError::StorageMessage("disk full".into()).is_persistence());
        assert!(AppError::Io(std::io::Error::other("boom")).is_persistence());
        assert!(!AppError::NotFound.is_persistence());
        assert!(!AppError::Validation("empty".into()).is_persistence());
        assert!(!AppError::Conflict("dup".into()).is_persistence());
    }
}
