//! Enrollment and verification of face identities.
//!
//! Two layers:
//!
//! - [`Enrollment`] and [`Verification`] work on encodings that are already
//!   extracted. They resolve every store and distance error into the closed
//!   response vocabulary of [`EnrollOutcome`] and [`VerifyOutcome`].
//! - [`FaceService`] accepts images, runs the [`FaceExtractor`] under a
//!   timeout, and hands the encoding to the workflows.
//!
//! [`FaceExtractor`]: faceid_extract::FaceExtractor

mod config;
mod enroll;
mod outcome;
mod service;
mod verify;

pub use config::{DEFAULT_EXTRACTION_TIMEOUT, ServiceConfig};
pub use enroll::{EnrollRequest, Enrollment};
pub use outcome::{EnrollOutcome, ValidationError, VerifyOutcome};
pub use service::{EnrollImageRequest, FaceService};
pub use verify::Verification;
