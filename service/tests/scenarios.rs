//! End-to-end flows through `FaceService` with scripted extractors.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use faceid_extract::{ExtractError, Extraction, FaceExtractor};
use faceid_identity::{EncodingStore, Field};
use faceid_service::{
    EnrollImageRequest, EnrollOutcome, FaceService, ServiceConfig, ValidationError, VerifyOutcome,
};

/// Maps image bytes to a fixed extraction result.
#[derive(Default)]
struct StubExtractor {
    faces: HashMap<Vec<u8>, Extraction>,
}

impl StubExtractor {
    fn with(mut self, image: &str, encoding: Vec<f64>) -> Self {
        self.faces
            .insert(image.as_bytes().to_vec(), Extraction::Encoding(encoding));
        self
    }
}

#[async_trait::async_trait]
impl FaceExtractor for StubExtractor {
    async fn extract(&self, image: &[u8]) -> Result<Extraction, ExtractError> {
        Ok(self.faces.get(image).cloned().unwrap_or(Extraction::NoFace))
    }
}

struct SlowExtractor(Duration);

#[async_trait::async_trait]
impl FaceExtractor for SlowExtractor {
    async fn extract(&self, _image: &[u8]) -> Result<Extraction, ExtractError> {
        tokio::time::sleep(self.0).await;
        Ok(Extraction::Encoding(vec![0.0, 0.0, 0.0]))
    }
}

struct FailingExtractor;

#[async_trait::async_trait]
impl FaceExtractor for FailingExtractor {
    async fn extract(&self, _image: &[u8]) -> Result<Extraction, ExtractError> {
        Err(ExtractError::MalformedOutput("garbage".into()))
    }
}

fn service(extractor: impl FaceExtractor + 'static) -> FaceService {
    FaceService::new(
        Arc::new(EncodingStore::in_memory(3).unwrap()),
        Arc::new(extractor),
        ServiceConfig {
            extraction_timeout: Duration::from_millis(200),
            ..ServiceConfig::default()
        },
    )
}

fn enroll_request(image: &str, tag: &str) -> EnrollImageRequest {
    EnrollImageRequest {
        image: image.as_bytes().to_vec(),
        name: tag.to_string(),
        email: format!("{tag}@example.com"),
        external_user_id: format!("user-{tag}"),
    }
}

#[tokio::test]
async fn enrolled_face_is_recognized() {
    let svc = service(
        StubExtractor::default()
            .with("alice.png", vec![0.0, 0.0, 0.0])
            .with("alice-again.png", vec![0.0, 0.0, 0.1]),
    );

    let outcome = svc.enroll(enroll_request("alice.png", "alice")).await;
    assert_eq!(outcome.kind(), "enrolled");
    assert_eq!(outcome.message(), "alice registered successfully");

    match svc.verify(b"alice-again.png").await {
        VerifyOutcome::Verified(record) => {
            assert_eq!(record.name, "alice");
            assert_eq!(record.external_user_id, "user-alice");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn stranger_is_not_found() {
    let svc = service(
        StubExtractor::default()
            .with("alice.png", vec![0.0, 0.0, 0.0])
            .with("stranger.png", vec![1.0, 1.0, 1.0]),
    );
    assert!(svc.enroll(enroll_request("alice.png", "alice")).await.is_enrolled());

    let outcome = svc.verify(b"stranger.png").await;
    assert!(matches!(outcome, VerifyOutcome::NotFound));
    assert_eq!(outcome.message(), "user not found");
}

#[tokio::test]
async fn same_face_under_new_account_is_rejected() {
    let svc = service(
        StubExtractor::default()
            .with("alice.png", vec![0.0, 0.0, 0.0])
            .with("alice-twin.png", vec![0.0, 0.0, 0.05]),
    );
    assert!(svc.enroll(enroll_request("alice.png", "alice")).await.is_enrolled());

    let outcome = svc.enroll(enroll_request("alice-twin.png", "mallory")).await;
    assert!(matches!(outcome, EnrollOutcome::DuplicateFace));
    assert_eq!(svc.store().len(), 1);
}

#[tokio::test]
async fn reused_email_is_rejected() {
    let svc = service(
        StubExtractor::default()
            .with("alice.png", vec![0.0, 0.0, 0.0])
            .with("bob.png", vec![2.0, 2.0, 2.0]),
    );
    assert!(svc.enroll(enroll_request("alice.png", "alice")).await.is_enrolled());

    let mut bob = enroll_request("bob.png", "bob");
    bob.email = "  ALICE@example.com ".into();
    let outcome = svc.enroll(bob).await;
    assert!(matches!(outcome, EnrollOutcome::DuplicateField(Field::Email)));
    assert_eq!(outcome.message(), "email already exists");
    assert_eq!(svc.store().len(), 1);
}

#[tokio::test]
async fn verifies_among_many_identities() {
    let mut stub = StubExtractor::default();
    for i in 0..20 {
        stub = stub.with(&format!("{i}.png"), vec![i as f64, 0.0, 0.0]);
    }
    stub = stub.with("query.png", vec![7.1, 0.0, 0.0]);
    let svc = service(stub);

    for i in 0..20 {
        let outcome = svc
            .enroll(enroll_request(&format!("{i}.png"), &format!("u{i}")))
            .await;
        assert!(outcome.is_enrolled(), "enroll {i}: {outcome:?}");
    }

    match svc.verify(b"query.png").await {
        VerifyOutcome::Verified(record) => assert_eq!(record.name, "u7"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_enrollments_of_one_face_keep_one_record() {
    let svc = Arc::new(service(
        StubExtractor::default().with("face.png", vec![0.5, 0.5, 0.5]),
    ));

    let mut handles = Vec::new();
    for i in 0..12 {
        let svc = Arc::clone(&svc);
        handles.push(tokio::spawn(async move {
            svc.enroll(enroll_request("face.png", &format!("racer{i}")))
                .await
        }));
    }

    let mut enrolled = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            EnrollOutcome::Enrolled(_) => enrolled += 1,
            EnrollOutcome::DuplicateFace => duplicates += 1,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert_eq!(enrolled, 1);
    assert_eq!(duplicates, 11);
    assert_eq!(svc.store().len(), 1);
}

#[tokio::test]
async fn slow_extractor_times_out() {
    let svc = service(SlowExtractor(Duration::from_secs(5)));
    let outcome = svc.enroll(enroll_request("any.png", "alice")).await;
    assert!(matches!(outcome, EnrollOutcome::ExtractionFailed));
    assert!(svc.store().is_empty());

    assert!(matches!(
        svc.verify(b"any.png").await,
        VerifyOutcome::ExtractionFailed
    ));
}

#[tokio::test]
async fn extractor_error_is_extraction_failed() {
    let svc = service(FailingExtractor);
    assert!(matches!(
        svc.enroll(enroll_request("a.png", "alice")).await,
        EnrollOutcome::ExtractionFailed
    ));
    assert!(matches!(
        svc.verify(b"a.png").await,
        VerifyOutcome::ExtractionFailed
    ));
}

#[tokio::test]
async fn wrong_dimension_encodings() {
    let svc = service(StubExtractor::default().with("short.png", vec![0.0, 0.0]));

    match svc.enroll(enroll_request("short.png", "alice")).await {
        EnrollOutcome::ValidationError(ValidationError::InvalidEncoding(_)) => {}
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(matches!(
        svc.verify(b"short.png").await,
        VerifyOutcome::ExtractionFailed
    ));
    assert!(svc.store().is_empty());
}

#[tokio::test]
async fn missing_fields_are_listed() {
    let svc = service(StubExtractor::default());
    let outcome = svc
        .enroll(EnrollImageRequest {
            image: b"x".to_vec(),
            name: "alice".into(),
            email: " ".into(),
            external_user_id: String::new(),
        })
        .await;
    assert_eq!(outcome.message(), "missing required fields: email, userId");
}
