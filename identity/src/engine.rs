use std::sync::Arc;

use crate::distance::euclidean_distance;
use crate::record::IdentityRecord;
use crate::IdentityError;

/// Default maximum distance for two encodings to be the same identity.
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// The closest enrolled identity for a query.
#[derive(Debug, Clone)]
pub struct Match {
    pub record: Arc<IdentityRecord>,

    /// Euclidean distance between the query and `record.encoding`.
    pub distance: f64,
}

/// Finds the closest identity within a distance threshold.
///
/// The scan is linear in the number of candidates.
#[derive(Debug, Clone, Copy)]
pub struct MatchEngine {
    threshold: f64,
}

impl MatchEngine {
    /// Creates an engine. A zero, negative or non-finite threshold falls
    /// back to [`DEFAULT_THRESHOLD`].
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_finite() && threshold > 0.0 {
            threshold
        } else {
            DEFAULT_THRESHOLD
        };
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns the candidate closest to `query` if its distance is strictly
    /// below the threshold.
    ///
    /// Ties on the minimum distance go to the earliest candidate, so with
    /// an insertion-ordered snapshot the first enrolled identity wins.
    pub fn nearest_match(
        &self,
        query: &[f64],
        candidates: &[Arc<IdentityRecord>],
    ) -> Result<Option<Match>, IdentityError> {
        let mut best: Option<(usize, f64)> = None;
        for (i, candidate) in candidates.iter().enumerate() {
            let d = euclidean_distance(query, &candidate.encoding)?;
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((i, d)),
            }
        }

        Ok(best
            .filter(|&(_, d)| d < self.threshold)
            .map(|(i, distance)| Match {
                record: Arc::clone(&candidates[i]),
                distance,
            }))
    }
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}
