//! Durable storage for identity records.
//!
//! [`RedbRepository`] implements
//! [`RecordRepository`](faceid_identity::RecordRepository) on a single redb
//! file. It enforces email and external user id uniqueness inside each
//! write transaction, behind the in-memory check of
//! [`EncodingStore`](faceid_identity::EncodingStore).

mod error;
mod repository;

pub use error::StorageError;
pub use repository::RedbRepository;
