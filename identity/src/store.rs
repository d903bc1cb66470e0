use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use tracing::debug;
use uuid::Uuid;

use crate::engine::Match;
use crate::record::{IdentityRecord, NewIdentity};
use crate::repository::{MemoryRepository, RecordRepository};
use crate::{Field, IdentityError};

struct StoreInner {
    records: Vec<Arc<IdentityRecord>>,
    emails: HashSet<String>,
    user_ids: HashSet<String>,
}

impl StoreInner {
    fn check_unique(&self, email: &str, user_id: &str) -> Result<(), IdentityError> {
        if self.emails.contains(email) {
            return Err(IdentityError::DuplicateField(Field::Email));
        }
        if self.user_ids.contains(user_id) {
            return Err(IdentityError::DuplicateField(Field::ExternalUserId));
        }
        Ok(())
    }

    fn push(&mut self, record: Arc<IdentityRecord>) {
        self.emails.insert(record.email.clone());
        self.user_ids.insert(record.external_user_id.clone());
        self.records.push(record);
    }
}

/// Concurrency-safe set of enrolled identities with a fixed encoding
/// dimension.
///
/// Readers ([`EncodingStore::snapshot`]) run in parallel with each other
/// and with the scan phase of a writer. Writers are mutually exclusive:
/// the scan, the uniqueness check, the repository append and the insert
/// of one writer all happen before the next writer starts its scan.
pub struct EncodingStore {
    dim: usize,
    inner: RwLock<StoreInner>,
    repo: Box<dyn RecordRepository>,
}

impl EncodingStore {
    /// Opens a store over `repo`, loading every record it already holds.
    ///
    /// Fails if `dim` is zero, if a stored record has another dimension, or
    /// if stored records violate uniqueness.
    pub fn open(dim: usize, repo: Box<dyn RecordRepository>) -> Result<Self, IdentityError> {
        if dim == 0 {
            return Err(IdentityError::InvalidDimension(dim));
        }

        let mut inner = StoreInner {
            records: Vec::new(),
            emails: HashSet::new(),
            user_ids: HashSet::new(),
        };
        for record in repo.load_all()? {
            if record.encoding.len() != dim {
                return Err(IdentityError::DimensionMismatch {
                    expected: dim,
                    got: record.encoding.len(),
                });
            }
            inner
                .check_unique(&record.email, &record.external_user_id)
                .map_err(|err| {
                    IdentityError::Store(format!("stored record {} is inconsistent: {err}", record.id))
                })?;
            inner.push(Arc::new(record));
        }

        debug!(dim, records = inner.records.len(), "encoding store opened");
        Ok(Self {
            dim,
            inner: RwLock::new(inner),
            repo,
        })
    }

    /// Opens an empty store backed by a [`MemoryRepository`].
    pub fn in_memory(dim: usize) -> Result<Self, IdentityError> {
        Self::open(dim, Box::new(MemoryRepository::new()))
    }

    /// Returns the encoding dimension every record shares.
    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a point-in-time view of all records in insertion order.
    pub fn snapshot(&self) -> Vec<Arc<IdentityRecord>> {
        self.inner.read().records.clone()
    }

    /// Inserts `candidate` if its email and external user id are unused.
    pub fn try_insert(&self, candidate: NewIdentity) -> Result<Arc<IdentityRecord>, IdentityError> {
        self.insert_if_no_match(candidate, |_| Ok(None))
    }

    /// Scans the current records with `matcher` and inserts `candidate`
    /// only if nothing matched and its unique fields are unused.
    ///
    /// The whole call is one writer section: no other writer can insert
    /// between the scan and the insert. Fails with
    /// [`IdentityError::DuplicateFace`] when the matcher finds a record and
    /// with [`IdentityError::DuplicateField`] on a field collision. On any
    /// failure the store is unchanged.
    pub fn insert_if_no_match<F>(
        &self,
        candidate: NewIdentity,
        matcher: F,
    ) -> Result<Arc<IdentityRecord>, IdentityError>
    where
        F: FnOnce(&[Arc<IdentityRecord>]) -> Result<Option<Match>, IdentityError>,
    {
        if candidate.encoding.len() != self.dim {
            return Err(IdentityError::DimensionMismatch {
                expected: self.dim,
                got: candidate.encoding.len(),
            });
        }

        // Upgradable reads exclude each other but not plain readers.
        let inner = self.inner.upgradable_read();

        if let Some(found) = matcher(inner.records.as_slice())? {
            return Err(IdentityError::DuplicateFace {
                id: found.record.id.clone(),
                distance: found.distance,
            });
        }
        inner.check_unique(&candidate.email, &candidate.external_user_id)?;

        let record = candidate.into_record(Uuid::new_v4().to_string(), Utc::now());
        self.repo.append(&record)?;

        let record = Arc::new(record);
        let mut inner = RwLockUpgradableReadGuard::upgrade(inner);
        inner.push(Arc::clone(&record));
        debug!(id = %record.id, total = inner.records.len(), "identity inserted");
        Ok(record)
    }
}
