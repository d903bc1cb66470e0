//! Face encoding extraction.
//!
//! [`FaceExtractor`] is the seam between an image and the encoding the
//! matching engine works on. [`ProcessExtractor`] runs an external
//! recognizer program per image and reads its answer from stdout.

pub mod error;
pub mod extractor;
pub mod process;

pub use error::ExtractError;
pub use extractor::{Extraction, FaceExtractor};
pub use process::{ProcessExtractor, parse_output};
