//! Identity matching over fixed-length face encodings.
//!
//! The crate holds the three pieces every enrollment and verification
//! goes through:
//!
//! 1. [`euclidean_distance`]: compares two encodings.
//! 2. [`MatchEngine`]: finds the closest enrolled identity under a threshold.
//! 3. [`EncodingStore`]: the shared set of [`IdentityRecord`]s.
//!
//! # Usage
//!
//! ```
//! use faceid_identity::{EncodingStore, MatchEngine, NewIdentity};
//!
//! let store = EncodingStore::in_memory(3).unwrap();
//! let engine = MatchEngine::default();
//!
//! let alice = NewIdentity::new("Alice", "alice@example.com", "u-1", vec![0.0, 0.0, 0.0]);
//! store
//!     .insert_if_no_match(alice, |records| engine.nearest_match(&[0.0, 0.0, 0.0], records))
//!     .unwrap();
//!
//! let found = engine.nearest_match(&[0.0, 0.0, 0.1], &store.snapshot()).unwrap();
//! assert_eq!(found.unwrap().record.name, "Alice");
//! ```
//!
//! # Concurrency
//!
//! [`EncodingStore::insert_if_no_match`] runs the duplicate scan, the
//! uniqueness check and the insert as one section that excludes other
//! writers. Two concurrent enrollments of the same face cannot both pass
//! the scan. Snapshots keep running in parallel with that section.

mod distance;
mod engine;
mod error;
mod record;
mod repository;
mod store;

pub use distance::euclidean_distance;
pub use engine::{DEFAULT_THRESHOLD, Match, MatchEngine};
pub use error::{Field, IdentityError};
pub use record::{IdentityRecord, NewIdentity, normalize_email, normalize_user_id};
pub use repository::{MemoryRepository, RecordRepository};
pub use store::EncodingStore;
