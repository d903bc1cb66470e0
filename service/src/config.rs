use std::time::Duration;

use faceid_identity::DEFAULT_THRESHOLD;

/// Default bound on a single extractor call.
pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Tuning for [`FaceService`](crate::FaceService).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Maximum distance (exclusive) for two encodings to be one identity.
    pub threshold: f64,

    /// Bound on one extractor call. Timed-out calls are cancelled.
    pub extraction_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            extraction_timeout: DEFAULT_EXTRACTION_TIMEOUT,
        }
    }
}
