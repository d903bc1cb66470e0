use std::sync::Arc;

use faceid_identity::{EncodingStore, IdentityError, MatchEngine, NewIdentity};
use tracing::{debug, error, info, warn};

use crate::outcome::{EnrollOutcome, INTERNAL_MESSAGE, ValidationError};

/// An enrollment with an already extracted encoding.
#[derive(Debug, Clone, Default)]
pub struct EnrollRequest {
    pub name: String,
    pub email: String,
    pub external_user_id: String,
    pub encoding: Vec<f64>,
}

/// Registers new identities, refusing faces and fields that are taken.
#[derive(Clone)]
pub struct Enrollment {
    store: Arc<EncodingStore>,
    engine: MatchEngine,
}

impl Enrollment {
    pub fn new(store: Arc<EncodingStore>, engine: MatchEngine) -> Self {
        Self { store, engine }
    }

    /// Validates `request` and inserts it unless its face matches an
    /// enrolled identity or its email or user id is taken.
    ///
    /// The duplicate-face scan and the insert are one atomic store call,
    /// so concurrent enrollments of one face yield a single record. A
    /// rejected attempt leaves the store unchanged.
    pub fn enroll(&self, request: EnrollRequest) -> EnrollOutcome {
        if let Err(err) = validate(&request) {
            debug!(error = %err, "enrollment rejected by validation");
            return EnrollOutcome::ValidationError(err);
        }

        let candidate = NewIdentity::new(
            &request.name,
            &request.email,
            &request.external_user_id,
            request.encoding,
        );
        let query = candidate.encoding.clone();
        let engine = self.engine;

        let result = self
            .store
            .insert_if_no_match(candidate, |records| engine.nearest_match(&query, records));

        match result {
            Ok(record) => {
                info!(
                    id = %record.id,
                    email = %record.email,
                    user_id = %record.external_user_id,
                    "identity enrolled"
                );
                EnrollOutcome::Enrolled(record)
            }
            Err(IdentityError::DuplicateFace { id, distance }) => {
                info!(existing = %id, distance, "enrollment rejected: face already enrolled");
                EnrollOutcome::DuplicateFace
            }
            Err(IdentityError::DuplicateField(field)) => {
                info!(%field, "enrollment rejected: field already in use");
                EnrollOutcome::DuplicateField(field)
            }
            Err(IdentityError::DimensionMismatch { expected, got }) => {
                warn!(
                    expected,
                    got, "encoding dimension differs from store; check the extractor output"
                );
                EnrollOutcome::ValidationError(ValidationError::InvalidEncoding(format!(
                    "expected {expected} values, got {got}"
                )))
            }
            Err(err @ (IdentityError::InvalidDimension(_) | IdentityError::Store(_))) => {
                error!(error = %err, "enrollment failed");
                EnrollOutcome::InternalError(INTERNAL_MESSAGE.to_string())
            }
        }
    }
}

fn validate(request: &EnrollRequest) -> Result<(), ValidationError> {
    let missing = missing_fields(
        &request.name,
        &request.email,
        &request.external_user_id,
        request.encoding.is_empty(),
        "encoding",
    );
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    if let Some(idx) = request.encoding.iter().position(|v| !v.is_finite()) {
        return Err(ValidationError::InvalidEncoding(format!(
            "non-finite value at index {idx}"
        )));
    }
    Ok(())
}

/// Returns the names of blank required fields, in request order.
/// `payload` names the face payload (`image` or `encoding`).
pub(crate) fn missing_fields(
    name: &str,
    email: &str,
    external_user_id: &str,
    payload_missing: bool,
    payload: &'static str,
) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if payload_missing {
        missing.push(payload);
    }
    if name.trim().is_empty() {
        missing.push("name");
    }
    if email.trim().is_empty() {
        missing.push("email");
    }
    if external_user_id.trim().is_empty() {
        missing.push("userId");
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use faceid_identity::Field;

    fn enrollment(dim: usize) -> Enrollment {
        Enrollment::new(
            Arc::new(EncodingStore::in_memory(dim).unwrap()),
            MatchEngine::default(),
        )
    }

    fn request(tag: &str, encoding: Vec<f64>) -> EnrollRequest {
        EnrollRequest {
            name: tag.to_uppercase(),
            email: format!("{tag}@example.com"),
            external_user_id: format!("id-{tag}"),
            encoding,
        }
    }

    #[test]
    fn enrolls_valid_request() {
        let e = enrollment(3);
        let outcome = e.enroll(request("a", vec![0.0, 0.0, 0.0]));
        match outcome {
            EnrollOutcome::Enrolled(record) => {
                assert_eq!(record.name, "A");
                assert_eq!(record.email, "a@example.com");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn reports_all_missing_fields() {
        let e = enrollment(3);
        let outcome = e.enroll(EnrollRequest {
            name: "  ".into(),
            email: String::new(),
            external_user_id: "u".into(),
            encoding: Vec::new(),
        });
        match outcome {
            EnrollOutcome::ValidationError(ValidationError::MissingFields(fields)) => {
                assert_eq!(fields, ["encoding", "name", "email"]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_finite_encoding() {
        let e = enrollment(2);
        let outcome = e.enroll(request("a", vec![0.0, f64::NAN]));
        assert!(matches!(
            outcome,
            EnrollOutcome::ValidationError(ValidationError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn dimension_mismatch_is_validation_error() {
        let e = enrollment(3);
        let outcome = e.enroll(request("a", vec![0.0, 0.0]));
        match outcome {
            EnrollOutcome::ValidationError(ValidationError::InvalidEncoding(message)) => {
                assert_eq!(message, "expected 3 values, got 2");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn same_face_twice_is_duplicate_face() {
        let e = enrollment(3);
        assert!(e.enroll(request("a", vec![0.0, 0.0, 0.0])).is_enrolled());
        let outcome = e.enroll(request("b", vec![0.0, 0.0, 0.05]));
        assert!(matches!(outcome, EnrollOutcome::DuplicateFace));
        assert_eq!(e.store.len(), 1);
    }

    #[test]
    fn shared_email_is_duplicate_field() {
        let e = enrollment(3);
        assert!(e.enroll(request("a", vec![0.0, 0.0, 0.0])).is_enrolled());

        let mut second = request("b", vec![1.0, 1.0, 1.0]);
        second.email = "A@Example.com".into();
        let outcome = e.enroll(second);
        assert!(matches!(outcome, EnrollOutcome::DuplicateField(Field::Email)));
    }

    #[test]
    fn shared_user_id_is_duplicate_field() {
        let e = enrollment(1);
        assert!(e.enroll(request("a", vec![0.0])).is_enrolled());

        let mut second = request("b", vec![5.0]);
        second.external_user_id = " id-a ".into();
        let outcome = e.enroll(second);
        assert!(matches!(
            outcome,
            EnrollOutcome::DuplicateField(Field::ExternalUserId)
        ));
    }

    #[test]
    fn missing_fields_order() {
        assert_eq!(
            missing_fields("", "", "", true, "image"),
            ["image", "name", "email", "userId"]
        );
        assert!(missing_fields("n", "e", "u", false, "image").is_empty());
    }
}
