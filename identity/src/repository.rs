use std::sync::Arc;

use parking_lot::Mutex;

use crate::record::IdentityRecord;
use crate::{Field, IdentityError};

/// Durable home of identity records.
///
/// The [`EncodingStore`](crate::EncodingStore) keeps the working set in
/// memory and writes every accepted record through to a repository.
/// Implementations enforce email and external user id uniqueness on their
/// own, behind the store's in-memory check.
///
/// Implementations must be safe for concurrent use.
pub trait RecordRepository: Send + Sync {
    /// Returns every stored record in insertion order.
    fn load_all(&self) -> Result<Vec<IdentityRecord>, IdentityError>;

    /// Persists one record atomically. Fails with
    /// [`IdentityError::DuplicateField`] on a uniqueness collision.
    fn append(&self, record: &IdentityRecord) -> Result<(), IdentityError>;
}

/// In-memory [`RecordRepository`].
/// Data is lost on restart. Clones share the same records.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    records: Arc<Mutex<Vec<IdentityRecord>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordRepository for MemoryRepository {
    fn load_all(&self) -> Result<Vec<IdentityRecord>, IdentityError> {
        Ok(self.records.lock().clone())
    }

    fn append(&self, record: &IdentityRecord) -> Result<(), IdentityError> {
        let mut records = self.records.lock();
        if records.iter().any(|r| r.email == record.email) {
            return Err(IdentityError::DuplicateField(Field::Email));
        }
        if records
            .iter()
            .any(|r| r.external_user_id == record.external_user_id)
        {
            return Err(IdentityError::DuplicateField(Field::ExternalUserId));
        }
        records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str, email: &str, user_id: &str) -> IdentityRecord {
        IdentityRecord {
            id: id.into(),
            name: "n".into(),
            email: email.into(),
            external_user_id: user_id.into(),
            encoding: vec![0.0, 1.0],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn append_and_load_in_order() {
        let repo = MemoryRepository::new();
        repo.append(&record("1", "a@x", "a")).unwrap();
        repo.append(&record("2", "b@x", "b")).unwrap();

        let all = repo.load_all().unwrap();
        let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
    }

    #[test]
    fn rejects_duplicate_email() {
        let repo = MemoryRepository::new();
        repo.append(&record("1", "a@x", "a")).unwrap();
        let err = repo.append(&record("2", "a@x", "b")).unwrap_err();
        assert!(matches!(err, IdentityError::DuplicateField(Field::Email)));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn rejects_duplicate_user_id() {
        let repo = MemoryRepository::new();
        repo.append(&record("1", "a@x", "a")).unwrap();
        let err = repo.append(&record("2", "b@x", "a")).unwrap_err();
        assert!(matches!(
            err,
            IdentityError::DuplicateField(Field::ExternalUserId)
        ));
    }

    #[test]
    fn clones_share_records() {
        let repo = MemoryRepository::new();
        let other = repo.clone();
        repo.append(&record("1", "a@x", "a")).unwrap();
        assert_eq!(other.len(), 1);
    }
}
