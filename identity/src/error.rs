use std::fmt;

use thiserror::Error;

/// A store-wide unique field of an [`IdentityRecord`](crate::IdentityRecord).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Email,
    ExternalUserId,
}

impl Field {
    /// Returns the field name as clients send it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::ExternalUserId => "userId",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("invalid dimension: {0}")]
    InvalidDimension(usize),

    #[error("face already enrolled as {id} (distance {distance:.4})")]
    DuplicateFace { id: String, distance: f64 },

    #[error("{0} already exists")]
    DuplicateField(Field),

    #[error("store error: {0}")]
    Store(String),
}
