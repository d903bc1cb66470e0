use std::sync::Arc;

use faceid_identity::{EncodingStore, MatchEngine};
use tracing::{error, info, warn};

use crate::outcome::{INTERNAL_MESSAGE, VerifyOutcome};

/// Identifies a face against the enrolled identities.
#[derive(Clone)]
pub struct Verification {
    store: Arc<EncodingStore>,
    engine: MatchEngine,
}

impl Verification {
    pub fn new(store: Arc<EncodingStore>, engine: MatchEngine) -> Self {
        Self { store, engine }
    }

    /// Returns the enrolled identity nearest to `encoding`, if it is within
    /// the match threshold. Never modifies the store.
    pub fn verify(&self, encoding: &[f64]) -> VerifyOutcome {
        let dim = self.store.dimension();
        if encoding.len() != dim {
            warn!(
                expected = dim,
                got = encoding.len(),
                "query encoding has the wrong dimension"
            );
            return VerifyOutcome::ExtractionFailed;
        }
        if let Some(idx) = encoding.iter().position(|v| !v.is_finite()) {
            warn!(index = idx, "query encoding has a non-finite value");
            return VerifyOutcome::ExtractionFailed;
        }

        let records = self.store.snapshot();
        match self.engine.nearest_match(encoding, &records) {
            Ok(Some(found)) => {
                info!(id = %found.record.id, distance = found.distance, "identity verified");
                VerifyOutcome::Verified(found.record)
            }
            Ok(None) => {
                info!(candidates = records.len(), "no identity within threshold");
                VerifyOutcome::NotFound
            }
            Err(err) => {
                error!(error = %err, "verification failed");
                VerifyOutcome::InternalError(INTERNAL_MESSAGE.to_string())
            }
        }
    }
}
