use faceid_identity::{Field, IdentityError};
use thiserror::Error;

/// Errors that can occur in storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage: database error: {0}")]
    Database(String),

    #[error("storage: serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage: {0} already exists")]
    Duplicate(Field),
}

impl From<StorageError> for IdentityError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate(field) => IdentityError::DuplicateField(field),
            other => IdentityError::Store(other.to_string()),
        }
    }
}

/// Maps any redb error into [`StorageError::Database`].
pub(crate) fn db_err(err: impl std::fmt::Display) -> StorageError {
    StorageError::Database(err.to_string())
}
