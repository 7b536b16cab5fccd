//! End-to-end signing and verification against the in-memory store

use std::sync::Arc;

use odontolegal::auth::{Claims, JwtValidator, Role, TokenInput};
use odontolegal::db::{
    DocumentKind, DocumentStatus, MemorySignableStore, ReportDoc, SignableStore, StoredDocument,
};
use odontolegal::logging::AuditLogger;
use odontolegal::services::{SigningService, VerificationLevel};
use odontolegal::signature::{
    content_hash, is_well_formed_code, Signable, SignableDocument, SignatureEngine, Signer,
    VerificationFailure,
};
use odontolegal::OdontoError;

const SECRET: &str = "integration-test-signing-secret-0123456789";

fn dr_x() -> Signer {
    Signer {
        id: "u1".into(),
        name: "Dr. X".into(),
        email: "x@y.com".into(),
        role: "perito".into(),
    }
}

#[test]
fn abc123_scenario_reports_both_hashes() {
    let engine = SignatureEngine::new(SECRET, 100).unwrap();
    let mut document = SignableDocument::new(
        "abc123",
        "Findings: fracture observed.",
        Some("Consistent with trauma."),
    );

    let signature = engine.sign_document(&document, &dr_x()).unwrap();
    assert_eq!(
        signature.content_hash,
        content_hash("abc123", "Findings: fracture observed.", Some("Consistent with trauma."))
    );
    assert!(is_well_formed_code(&signature.verification_code));

    let ok = engine.verify_signature(&document, Some(&signature));
    assert!(ok.valid);
    assert_eq!(ok.signed_by.unwrap().id, "u1");

    document.conclusion = Some("Inconclusive.".into());
    let tampered = engine.verify_signature(&document, Some(&signature));

    assert!(!tampered.valid);
    assert_eq!(tampered.reason, Some(VerificationFailure::ContentMismatch));
    let expected = tampered.expected_hash.unwrap();
    let current = tampered.current_hash.unwrap();
    assert_eq!(expected, signature.content_hash);
    assert_ne!(expected, current);
}

#[test]
fn signature_from_another_deployment_is_rejected() {
    let ours = SignatureEngine::new(SECRET, 100).unwrap();
    let theirs = SignatureEngine::new("another-deployment-secret-0123456789abcd", 100).unwrap();
    let document = SignableDocument::new("abc123", "Body", None);

    let signature = theirs.sign_document(&document, &dr_x()).unwrap();
    let result = ours.verify_signature(&document, Some(&signature));

    assert_eq!(result.reason, Some(VerificationFailure::InvalidToken));
}

#[test]
fn public_check_needs_both_code_and_hash() {
    let engine = SignatureEngine::new(SECRET, 100).unwrap();
    let mut document = SignableDocument::new("abc123", "Body", Some("Conclusion"));
    let signature = engine.sign_document(&document, &dr_x()).unwrap();
    document.digital_signature = Some(signature.clone());

    let both = engine.verify_document_by_hash(
        "abc123",
        &signature.content_hash,
        &signature.verification_code,
        Some(&document),
    );
    assert!(both.valid);

    let wrong_hash = engine.verify_document_by_hash(
        "abc123",
        &"0".repeat(64),
        &signature.verification_code,
        Some(&document),
    );
    assert_eq!(wrong_hash.reason, Some(VerificationFailure::ContentMismatch));

    let wrong_code = engine.verify_document_by_hash(
        "abc123",
        &signature.content_hash,
        "ZZZZZZZZ",
        Some(&document),
    );
    assert_eq!(wrong_code.reason, Some(VerificationFailure::InvalidCode));
}

#[tokio::test]
async fn sign_through_service_with_session_token() {
    let jwt = JwtValidator::new_dev();
    let issued = jwt
        .issue(TokenInput {
            user_id: "u1".into(),
            name: "Dr. X".into(),
            email: "x@y.com".into(),
            role: Role::Perito,
        })
        .unwrap();
    let claims: Claims = jwt.validate(&issued.token).unwrap();

    let store = Arc::new(MemorySignableStore::new());
    let mut report = ReportDoc::new(
        "case-42".into(),
        "Dental identification".into(),
        "Findings: fracture observed.".into(),
        "u1".into(),
    );
    report.conclusion = Some("Consistent with trauma.".into());
    report.status = DocumentStatus::Finalized;
    let id = store.insert(StoredDocument::Report(report)).await.unwrap();

    let service = SigningService::new(
        store.clone(),
        Arc::new(SignatureEngine::new(SECRET, 100).unwrap()),
        AuditLogger::new("it".into()),
        "https://laudos.example",
    );

    let outcome = service.sign(DocumentKind::Report, &id, &claims).await.unwrap();
    assert_eq!(
        outcome.verification_url,
        format!(
            "https://laudos.example/verify/{}?hash={}&code={}",
            id, outcome.signature.content_hash, outcome.signature.verification_code
        )
    );

    let stored = store.find(DocumentKind::Report, &id).await.unwrap().unwrap();
    assert_eq!(stored.status(), DocumentStatus::Signed);

    let again = service.sign(DocumentKind::Report, &id, &claims).await;
    assert!(matches!(again, Err(OdontoError::Conflict(_))));

    let public = service
        .public_verify(&id, &outcome.signature.content_hash, &outcome.signature.verification_code)
        .await
        .unwrap();
    assert!(public.result.valid);
    assert_eq!(public.verification_level, VerificationLevel::Code);

    let body = serde_json::to_value(&public).unwrap();
    assert_eq!(body["valid"], true);
    assert_eq!(body["verificationLevel"], "code");
    assert_eq!(body["document"]["signedBy"], "u1");
}

#[tokio::test]
async fn concurrent_sign_requests_produce_one_signature() {
    let store = Arc::new(MemorySignableStore::new());
    let mut report = ReportDoc::new("c".into(), "t".into(), "body".into(), "u1".into());
    report.status = DocumentStatus::Finalized;
    let id = store.insert(StoredDocument::Report(report)).await.unwrap();

    let service = Arc::new(SigningService::new(
        store.clone(),
        Arc::new(SignatureEngine::new_dev()),
        AuditLogger::new("it".into()),
        "http://localhost:8080",
    ));

    let claims = Claims {
        user_id: "u1".into(),
        name: "Dr. X".into(),
        email: "x@y.com".into(),
        role: Role::Admin,
        iat: 0,
        exp: 0,
    };

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        let claims = claims.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            service.sign(DocumentKind::Report, &id, &claims).await
        }));
    }

    let mut signed = Vec::new();
    for handle in handles {
        if let Ok(outcome) = handle.await.unwrap() {
            signed.push(outcome);
        }
    }
    assert_eq!(signed.len(), 1);

    let stored = store.find(DocumentKind::Report, &id).await.unwrap().unwrap();
    assert_eq!(
        stored.digital_signature().map(|s| s.verification_code.as_str()),
        Some(signed[0].signature.verification_code.as_str())
    );
}
