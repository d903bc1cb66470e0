use std::path::Path;

use faceid_identity::{Field, IdentityError, IdentityRecord, RecordRepository};
use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use crate::error::{StorageError, db_err};

/// Sequence number -> JSON-encoded record. Sequence order is insertion order.
const RECORDS: TableDefinition<u64, &[u8]> = TableDefinition::new("records");
/// Normalized email -> record sequence number.
const EMAILS: TableDefinition<&str, u64> = TableDefinition::new("emails");
/// Normalized external user id -> record sequence number.
const USER_IDS: TableDefinition<&str, u64> = TableDefinition::new("user_ids");

/// A persistent record repository backed by redb.
pub struct RedbRepository {
    db: Database,
}

impl RedbRepository {
    /// Open or create a repository at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = Database::create(path).map_err(db_err)?;

        // Create the tables if they don't exist
        let tx = db.begin_write().map_err(db_err)?;
        {
            tx.open_table(RECORDS).map_err(db_err)?;
            tx.open_table(EMAILS).map_err(db_err)?;
            tx.open_table(USER_IDS).map_err(db_err)?;
        }
        tx.commit().map_err(db_err)?;

        Ok(Self { db })
    }

    fn read_all(&self) -> Result<Vec<IdentityRecord>, StorageError> {
        let tx = self.db.begin_read().map_err(db_err)?;
        let table = tx.open_table(RECORDS).map_err(db_err)?;

        let mut records = Vec::new();
        for item in table.iter().map_err(db_err)? {
            let (_seq, value) = item.map_err(db_err)?;
            records.push(serde_json::from_slice(value.value())?);
        }
        Ok(records)
    }

    /// Writes one record and its unique keys in a single transaction.
    /// Returns the assigned sequence number.
    fn write(&self, record: &IdentityRecord) -> Result<u64, StorageError> {
        let payload = serde_json::to_vec(record)?;

        let tx = self.db.begin_write().map_err(db_err)?;
        let seq = {
            let mut emails = tx.open_table(EMAILS).map_err(db_err)?;
            if emails
                .get(record.email.as_str())
                .map_err(db_err)?
                .is_some()
            {
                return Err(StorageError::Duplicate(Field::Email));
            }

            let mut user_ids = tx.open_table(USER_IDS).map_err(db_err)?;
            if user_ids
                .get(record.external_user_id.as_str())
                .map_err(db_err)?
                .is_some()
            {
                return Err(StorageError::Duplicate(Field::ExternalUserId));
            }

            let mut records = tx.open_table(RECORDS).map_err(db_err)?;
            let seq = match records.last().map_err(db_err)? {
                Some((last, _)) => last.value() + 1,
                None => 1,
            };
            records
                .insert(seq, payload.as_slice())
                .map_err(db_err)?;
            emails
                .insert(record.email.as_str(), seq)
                .map_err(db_err)?;
            user_ids
                .insert(record.external_user_id.as_str(), seq)
                .map_err(db_err)?;
            seq
        };
        tx.commit().map_err(db_err)?;
        Ok(seq)
    }
}

impl RecordRepository for RedbRepository {
    fn load_all(&self) -> Result<Vec<IdentityRecord>, IdentityError> {
        let records = self.read_all()?;
        debug!(count = records.len(), "loaded identity records");
        Ok(records)
    }

    fn append(&self, record: &IdentityRecord) -> Result<(), IdentityError> {
        let seq = self.write(record)?;
        debug!(seq, id = %record.id, "persisted identity record");
        Ok(())
    }
}
