use std::fmt;
use std::sync::Arc;

use faceid_identity::{Field, IdentityRecord};

/// Message returned for every internal failure. Details go to the log.
pub(crate) const INTERNAL_MESSAGE: &str = "internal error";

/// A user-correctable problem with an enrollment request.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required fields that were absent or blank, in request order.
    MissingFields(Vec<&'static str>),
    /// The encoding has the wrong shape or non-finite values.
    InvalidEncoding(String),
    /// The image could not be decoded by the transport.
    InvalidImage(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFields(fields) => {
                write!(f, "missing required fields: {}", fields.join(", "))
            }
            Self::InvalidEncoding(message) => write!(f, "invalid face encoding: {message}"),
            Self::InvalidImage(message) => write!(f, "invalid image: {message}"),
        }
    }
}

/// Result of one enrollment attempt.
#[derive(Debug, Clone)]
pub enum EnrollOutcome {
    Enrolled(Arc<IdentityRecord>),
    ValidationError(ValidationError),
    /// No face found, or the extractor failed or timed out.
    ExtractionFailed,
    /// The face is already enrolled under another identity.
    DuplicateFace,
    /// Another identity already uses this field value.
    DuplicateField(Field),
    InternalError(String),
}

impl EnrollOutcome {
    /// Stable machine-readable name of the outcome.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Enrolled(_) => "enrolled",
            Self::ValidationError(_) => "validation_error",
            Self::ExtractionFailed => "extraction_failed",
            Self::DuplicateFace => "duplicate_face",
            Self::DuplicateField(_) => "duplicate_field",
            Self::InternalError(_) => "internal_error",
        }
    }

    /// Human-readable message for the caller.
    pub fn message(&self) -> String {
        match self {
            Self::Enrolled(record) => format!("{} registered successfully", record.name),
            Self::ValidationError(err) => err.to_string(),
            Self::ExtractionFailed => "no face detected".to_string(),
            Self::DuplicateFace => "face already registered".to_string(),
            Self::DuplicateField(field) => format!("{field} already exists"),
            Self::InternalError(message) => message.clone(),
        }
    }

    pub fn is_enrolled(&self) -> bool {
        matches!(self, Self::Enrolled(_))
    }
}

/// Result of one verification attempt.
#[derive(Debug, Clone)]
pub enum VerifyOutcome {
    Verified(Arc<IdentityRecord>),
    NotFound,
    /// No face found, or the extractor failed or timed out.
    ExtractionFailed,
    InternalError(String),
}

impl VerifyOutcome {
    /// Stable machine-readable name of the outcome.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Verified(_) => "verified",
            Self::NotFound => "not_found",
            Self::ExtractionFailed => "extraction_failed",
            Self::InternalError(_) => "internal_error",
        }
    }

    /// Human-readable message for the caller.
    pub fn message(&self) -> String {
        match self {
            Self::Verified(record) => format!("welcome back, {}!", record.name),
            Self::NotFound => "user not found".to_string(),
            Self::ExtractionFailed => "no face detected".to_string(),
            Self::InternalError(message) => message.clone(),
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }
}
