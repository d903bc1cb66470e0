use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An enrolled identity. Immutable once created by the store.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Assigned by the store at insertion.
    pub id: String,

    pub name: String,

    /// Trimmed and lower-cased. Unique store-wide.
    pub email: String,

    /// Trimmed. Unique store-wide.
    #[serde(rename = "userId")]
    pub external_user_id: String,

    /// Face encoding of the store's dimension.
    pub encoding: Vec<f64>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for IdentityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("external_user_id", &self.external_user_id)
            .field("encoding_len", &self.encoding.len())
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// A candidate identity waiting to be inserted.
///
/// [`NewIdentity::new`] normalizes the unique fields so that uniqueness
/// checks compare canonical values.
#[derive(Clone, PartialEq)]
pub struct NewIdentity {
    pub name: String,
    pub email: String,
    pub external_user_id: String,
    pub encoding: Vec<f64>,
}

impl NewIdentity {
    pub fn new(
        name: impl AsRef<str>,
        email: impl AsRef<str>,
        external_user_id: impl AsRef<str>,
        encoding: Vec<f64>,
    ) -> Self {
        Self {
            name: name.as_ref().trim().to_string(),
            email: normalize_email(email.as_ref()),
            external_user_id: normalize_user_id(external_user_id.as_ref()),
            encoding,
        }
    }

    pub(crate) fn into_record(self, id: String, created_at: DateTime<Utc>) -> IdentityRecord {
        IdentityRecord {
            id,
            name: self.name,
            email: self.email,
            external_user_id: self.external_user_id,
            encoding: self.encoding,
            created_at,
        }
    }
}

impl fmt::Debug for NewIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewIdentity")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("external_user_id", &self.external_user_id)
            .field("encoding_len", &self.encoding.len())
            .finish()
    }
}

/// Canonical form of an email for uniqueness: trimmed, lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Canonical form of an external user id for uniqueness: trimmed.
pub fn normalize_user_id(user_id: &str) -> String {
    user_id.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_identity_normalizes_fields() {
        let n = NewIdentity::new("  Alice ", " Alice@Example.COM ", "  u-1\t", vec![1.0]);
        assert_eq!(n.name, "Alice");
        assert_eq!(n.email, "alice@example.com");
        assert_eq!(n.external_user_id, "u-1");
    }

    #[test]
    fn user_id_keeps_case() {
        assert_eq!(normalize_user_id(" AbC "), "AbC");
    }

    #[test]
    fn debug_hides_encoding() {
        let n = NewIdentity::new("a", "b", "c", vec![0.25; 128]);
        let out = format!("{n:?}");
        assert!(out.contains("encoding_len: 128"));
        assert!(!out.contains("0.25"));
    }

    #[test]
    fn record_serializes_with_wire_names() {
        let record = NewIdentity::new("Alice", "a@x.io", "u-1", vec![0.5])
            .into_record("id-1".into(), Utc::now());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["userId"], "u-1");
        assert_eq!(json["email"], "a@x.io");
        assert!(json["createdAt"].is_string());

        let back: IdentityRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
