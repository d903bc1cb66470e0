//! JSON rendering of workflow outcomes, shared by the HTTP server and the CLI.

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use faceid_identity::IdentityRecord;
use faceid_service::{EnrollOutcome, VerifyOutcome};
use serde::Serialize;

/// Public view of an identity. Never carries the encoding.
#[derive(Debug, Serialize)]
pub struct UserView<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    #[serde(rename = "userId")]
    pub user_id: &'a str,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a IdentityRecord> for UserView<'a> {
    fn from(record: &'a IdentityRecord) -> Self {
        Self {
            id: &record.id,
            name: &record.name,
            email: &record.email,
            user_id: &record.external_user_id,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Body<'a> {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

pub fn enroll_response(outcome: &EnrollOutcome) -> (StatusCode, Body<'_>) {
    let status = match outcome {
        EnrollOutcome::Enrolled(_) => StatusCode::CREATED,
        EnrollOutcome::ValidationError(_) => StatusCode::BAD_REQUEST,
        EnrollOutcome::ExtractionFailed => StatusCode::UNPROCESSABLE_ENTITY,
        EnrollOutcome::DuplicateFace | EnrollOutcome::DuplicateField(_) => StatusCode::CONFLICT,
        EnrollOutcome::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = Body {
        status: outcome.kind(),
        message: outcome.message(),
        user: match outcome {
            EnrollOutcome::Enrolled(record) => Some(UserView::from(record.as_ref())),
            _ => None,
        },
        field: match outcome {
            EnrollOutcome::DuplicateField(field) => Some(field.as_str()),
            _ => None,
        },
    };
    (status, body)
}

pub fn verify_response(outcome: &VerifyOutcome) -> (StatusCode, Body<'_>) {
    let status = match outcome {
        VerifyOutcome::Verified(_) => StatusCode::OK,
        VerifyOutcome::NotFound => StatusCode::NOT_FOUND,
        VerifyOutcome::ExtractionFailed => StatusCode::UNPROCESSABLE_ENTITY,
        VerifyOutcome::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = Body {
        status: outcome.kind(),
        message: outcome.message(),
        user: match outcome {
            VerifyOutcome::Verified(record) => Some(UserView::from(record.as_ref())),
            _ => None,
        },
        field: None,
    };
    (status, body)
}

/// Body for a request rejected before it reaches a workflow.
pub fn validation_body(message: String) -> Body<'static> {
    Body {
        status: "validation_error",
        message,
        user: None,
        field: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faceid_identity::{EncodingStore, Field, NewIdentity};

    fn record() -> std::sync::Arc<IdentityRecord> {
        let store = EncodingStore::in_memory(2).unwrap();
        store
            .try_insert(NewIdentity::new("Alice", "alice@example.com", "a1", vec![0.1, 0.2]))
            .unwrap()
    }

    #[test]
    fn enrolled_body_hides_encoding() {
        let outcome = EnrollOutcome::Enrolled(record());
        let (status, body) = enroll_response(&outcome);
        assert_eq!(status, StatusCode::CREATED);

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "enrolled");
        assert_eq!(json["user"]["userId"], "a1");
        assert!(json["user"].get("encoding").is_none());
        assert!(json.get("field").is_none());
    }

    #[test]
    fn duplicates_are_conflicts() {
        let (status, _) = enroll_response(&EnrollOutcome::DuplicateFace);
        assert_eq!(status, StatusCode::CONFLICT);

        let outcome = EnrollOutcome::DuplicateField(Field::ExternalUserId);
        let (status, body) = enroll_response(&outcome);
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.field, Some("userId"));
        assert_eq!(body.message, "userId already exists");
    }

    #[test]
    fn verify_statuses() {
        let outcome = VerifyOutcome::Verified(record());
        let (status, body) = verify_response(&outcome);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.message, "welcome back, Alice!");

        assert_eq!(verify_response(&VerifyOutcome::NotFound).0, StatusCode::NOT_FOUND);
        assert_eq!(
            verify_response(&VerifyOutcome::ExtractionFailed).0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        let internal = VerifyOutcome::InternalError("internal error".into());
        let (status, body) = verify_response(&internal);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "internal error");
    }
}
