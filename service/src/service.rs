use std::sync::Arc;
use std::time::Duration;

use faceid_extract::{Extraction, FaceExtractor};
use faceid_identity::{EncodingStore, MatchEngine};
use tracing::{debug, error, info, warn};

use crate::config::ServiceConfig;
use crate::enroll::{EnrollRequest, Enrollment, missing_fields};
use crate::outcome::{EnrollOutcome, INTERNAL_MESSAGE, ValidationError, VerifyOutcome};
use crate::verify::Verification;

/// An enrollment that still needs its face extracted from an image.
#[derive(Debug, Clone, Default)]
pub struct EnrollImageRequest {
    pub image: Vec<u8>,
    pub name: String,
    pub email: String,
    pub external_user_id: String,
}

/// Image-level enrollment and verification.
///
/// Extraction runs outside any store lock and is bounded by
/// [`ServiceConfig::extraction_timeout`]. The store is only touched once an
/// encoding is in hand, and always from the blocking pool.
pub struct FaceService {
    store: Arc<EncodingStore>,
    extractor: Arc<dyn FaceExtractor>,
    enrollment: Enrollment,
    verification: Verification,
    extraction_timeout: Duration,
}

impl FaceService {
    pub fn new(
        store: Arc<EncodingStore>,
        extractor: Arc<dyn FaceExtractor>,
        config: ServiceConfig,
    ) -> Self {
        let engine = MatchEngine::new(config.threshold);
        Self {
            enrollment: Enrollment::new(Arc::clone(&store), engine),
            verification: Verification::new(Arc::clone(&store), engine),
            store,
            extractor,
            extraction_timeout: config.extraction_timeout,
        }
    }

    pub fn store(&self) -> &Arc<EncodingStore> {
        &self.store
    }

    pub async fn enroll(&self, request: EnrollImageRequest) -> EnrollOutcome {
        let missing = missing_fields(
            &request.name,
            &request.email,
            &request.external_user_id,
            request.image.is_empty(),
            "image",
        );
        if !missing.is_empty() {
            debug!(?missing, "enrollment rejected: missing fields");
            return EnrollOutcome::ValidationError(ValidationError::MissingFields(missing));
        }

        let Some(encoding) = self.extract(&request.image).await else {
            return EnrollOutcome::ExtractionFailed;
        };

        let enrollment = self.enrollment.clone();
        let request = EnrollRequest {
            name: request.name,
            email: request.email,
            external_user_id: request.external_user_id,
            encoding,
        };
        // The store call may hit the disk and waits on the writer lock.
        match tokio::task::spawn_blocking(move || enrollment.enroll(request)).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, "enrollment task failed");
                EnrollOutcome::InternalError(INTERNAL_MESSAGE.to_string())
            }
        }
    }

    pub async fn verify(&self, image: &[u8]) -> VerifyOutcome {
        if image.is_empty() {
            debug!("verification rejected: empty image");
            return VerifyOutcome::ExtractionFailed;
        }
        let Some(encoding) = self.extract(image).await else {
            return VerifyOutcome::ExtractionFailed;
        };

        let verification = self.verification.clone();
        // Same as enroll: the scan is linear in the number of identities.
        match tokio::task::spawn_blocking(move || verification.verify(&encoding)).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, "verification task failed");
                VerifyOutcome::InternalError(INTERNAL_MESSAGE.to_string())
            }
        }
    }

    /// Runs the extractor under the timeout. Every failure collapses to
    /// `None` after logging.
    async fn extract(&self, image: &[u8]) -> Option<Vec<f64>> {
        debug!(bytes = image.len(), "extracting face encoding");
        match tokio::time::timeout(self.extraction_timeout, self.extractor.extract(image)).await {
            Ok(Ok(Extraction::Encoding(encoding))) => {
                debug!(dim = encoding.len(), "face encoding extracted");
                Some(encoding)
            }
            Ok(Ok(Extraction::NoFace)) => {
                info!("no face detected in image");
                None
            }
            Ok(Err(err)) => {
                warn!(error = %err, "face extraction failed");
                None
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.extraction_timeout.as_millis() as u64,
                    "face extraction timed out"
                );
                None
            }
        }
    }
}
