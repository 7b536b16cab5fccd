//! Signing service
//!
//! Glues the signature engine to storage, roles and the audit trail:
//!
//! 1. check the caller's role
//! 2. load the document and check it is `finalized` and unsigned
//! 3. compute the signature
//! 4. persist it with the store's conditional update
//!
//! Step 4 is the only place where two concurrent requests are arbitrated; the
//! pre-check in step 2 just gives a clearer error in the common case.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::Claims;
use crate::db::{canonical_id, DocumentKind, DocumentStatus, SignableStore};
use crate::logging::AuditLogger;
use crate::signature::{
    verification_url, DigitalSignature, Signable, SignatureEngine, VerificationFailure,
    VerificationResult,
};
use crate::types::OdontoError;

/// Strength of the check behind a verification response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationLevel {
    /// Token decoded with the signing secret and hash recomputed from current content
    Cryptographic,
    /// Printed hash and code compared with stored values only
    Code,
}

/// Successful sign response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOutcome {
    pub signature: DigitalSignature,
    pub verification_url: String,
}

/// Verification result annotated with how it was obtained
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    #[serde(flatten)]
    pub result: VerificationResult,
    pub verification_level: VerificationLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_kind: Option<DocumentKind>,
}

pub struct SigningService {
    store: Arc<dyn SignableStore>,
    engine: Arc<SignatureEngine>,
    audit: AuditLogger,
    public_base_url: String,
}

impl SigningService {
    pub fn new(
        store: Arc<dyn SignableStore>,
        engine: Arc<SignatureEngine>,
        audit: AuditLogger,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            engine,
            audit,
            public_base_url: public_base_url.into(),
        }
    }

    pub fn store(&self) -> &Arc<dyn SignableStore> {
        &self.store
    }

    /// Sign a finalized document as the authenticated caller
    pub async fn sign(
        &self,
        kind: DocumentKind,
        id: &str,
        claims: &Claims,
    ) -> Result<SignOutcome, OdontoError> {
        if !claims.role.can_sign() {
            self.reject(kind, id, claims, "role may not sign").await;
            return Err(OdontoError::Forbidden(format!(
                "Role '{}' may not sign documents",
                claims.role
            )));
        }

        let document = self
            .store
            .find(kind, id)
            .await?
            .ok_or_else(|| OdontoError::NotFound(format!("{} {} not found", kind, id)))?;
        let stored_id = document.document_id();
        let id = stored_id.as_str();

        if document.digital_signature().is_some() {
            self.reject(kind, id, claims, "already signed").await;
            return Err(OdontoError::Conflict(format!("{} {} is already signed", kind, id)));
        }

        if document.status() != DocumentStatus::Finalized {
            let reason = format!("status is {}", document.status());
            self.reject(kind, id, claims, &reason).await;
            return Err(OdontoError::Conflict(format!(
                "{} {} must be finalized before signing ({})",
                kind, id, reason
            )));
        }

        let signature = self.engine.sign_document(&document, &claims.signer())?;

        if let Err(e) = self.store.mark_signed(kind, id, &signature).await {
            if matches!(e, OdontoError::Conflict(_)) {
                self.reject(kind, id, claims, "lost concurrent sign").await;
            }
            return Err(e);
        }

        info!(
            kind = %kind,
            document_id = %id,
            signer = %claims.user_id,
            "Document signed"
        );
        self.audit
            .log_signed(kind, id, &claims.user_id, &signature.content_hash)
            .await;

        let verification_url = verification_url(
            &self.public_base_url,
            id,
            &signature.content_hash,
            &signature.verification_code,
        );

        Ok(SignOutcome {
            signature,
            verification_url,
        })
    }

    /// Cryptographic verification of a stored document for an authenticated caller
    pub async fn verify(
        &self,
        kind: DocumentKind,
        id: &str,
        claims: &Claims,
    ) -> Result<VerificationResponse, OdontoError> {
        if !claims.role.can_verify() {
            return Err(OdontoError::Forbidden(format!(
                "Role '{}' may not verify documents",
                claims.role
            )));
        }

        let result = match self.store.find(kind, id).await? {
            Some(document) => self
                .engine
                .verify_signature(&document, document.digital_signature()),
            None => VerificationResult::invalid(VerificationFailure::DocumentNotFound),
        };

        debug!(kind = %kind, document_id = %id, valid = result.valid, "Signature checked");
        self.audit.log_verified(kind, id, &claims.user_id, &result).await;

        Ok(VerificationResponse {
            result,
            verification_level: VerificationLevel::Cryptographic,
            document_kind: Some(kind),
        })
    }

    /// Public check of a printed hash and verification code.
    ///
    /// Looks the id up among reports first, then evidence reports.
    pub async fn public_verify(
        &self,
        document_id: &str,
        hash: &str,
        code: &str,
    ) -> Result<VerificationResponse, OdontoError> {
        let requested = canonical_id(document_id);
        let document_id = requested.as_str();

        let mut found = None;
        for kind in [DocumentKind::Report, DocumentKind::EvidenceReport] {
            if let Some(document) = self.store.find(kind, document_id).await? {
                found = Some((kind, document));
                break;
            }
        }

        let document_kind = found.as_ref().map(|(kind, _)| *kind);
        let result = self.engine.verify_document_by_hash(
            document_id,
            hash,
            code,
            found.as_ref().map(|(_, document)| document),
        );

        if !result.valid {
            warn!(
                document_id = %document_id,
                reason = ?result.reason,
                "Public verification failed"
            );
        }
        self.audit
            .log_public_verification(document_kind, document_id, &result)
            .await;

        Ok(VerificationResponse {
            result,
            verification_level: VerificationLevel::Code,
            document_kind,
        })
    }

    async fn reject(&self, kind: DocumentKind, id: &str, claims: &Claims, reason: &str) {
        warn!(
            kind = %kind,
            document_id = %id,
            signer = %claims.user_id,
            reason = %reason,
            "Sign request rejected"
        );
        self.audit
            .log_sign_rejected(kind, id, &claims.user_id, reason)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::db::{EvidenceReportDoc, MemorySignableStore, ReportDoc, StoredDocument};

    fn claims(role: Role) -> Claims {
        Claims {
            user_id: "u1".into(),
            name: "Dr. X".into(),
            email: "x@y.com".into(),
            role,
            iat: 0,
            exp: 0,
        }
    }

    fn service() -> (SigningService, Arc<MemorySignableStore>) {
        let store = Arc::new(MemorySignableStore::new());
        let service = SigningService::new(
            store.clone(),
            Arc::new(SignatureEngine::new_dev()),
            AuditLogger::new("test".into()),
            "https://odonto.example/",
        );
        (service, store)
    }

    async fn finalized_report(store: &MemorySignableStore) -> String {
        let mut report = ReportDoc::new("case".into(), "Laudo".into(), "Body".into(), "u1".into());
        report.conclusion = Some("Positive identification".into());
        report.status = DocumentStatus::Finalized;
        store.insert(StoredDocument::Report(report)).await.unwrap()
    }

    #[tokio::test]
    async fn test_sign_then_verify() {
        let (service, store) = service();
        let id = finalized_report(&store).await;

        let outcome = service.sign(DocumentKind::Report, &id, &claims(Role::Perito)).await.unwrap();
        assert_eq!(outcome.signature.signed_by, "u1");
        assert!(outcome
            .verification_url
            .starts_with(&format!("https://odonto.example/verify/{}?hash=", id)));

        let response = service.verify(DocumentKind::Report, &id, &claims(Role::Assistente)).await.unwrap();
        assert!(response.result.valid);
        assert_eq!(response.verification_level, VerificationLevel::Cryptographic);

        let public = service
            .public_verify(&id, &outcome.signature.content_hash, &outcome.signature.verification_code)
            .await
            .unwrap();
        assert!(public.result.valid);
        assert_eq!(public.document_kind, Some(DocumentKind::Report));
        assert_eq!(public.result.document.unwrap().title.as_deref(), Some("Laudo"));
    }

    #[tokio::test]
    async fn test_assistant_cannot_sign() {
        let (service, store) = service();
        let id = finalized_report(&store).await;

        let result = service.sign(DocumentKind::Report, &id, &claims(Role::Assistente)).await;
        assert!(matches!(result, Err(OdontoError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_second_sign_conflicts() {
        let (service, store) = service();
        let id = finalized_report(&store).await;

        service.sign(DocumentKind::Report, &id, &claims(Role::Admin)).await.unwrap();
        let again = service.sign(DocumentKind::Report, &id, &claims(Role::Perito)).await;
        assert!(matches!(again, Err(OdontoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_draft_and_missing_documents() {
        let (service, store) = service();
        let draft = ReportDoc::new("case".into(), "t".into(), "b".into(), "u1".into());
        let draft_id = store.insert(StoredDocument::Report(draft)).await.unwrap();

        let result = service.sign(DocumentKind::Report, &draft_id, &claims(Role::Perito)).await;
        assert!(matches!(result, Err(OdontoError::Conflict(_))));

        let result = service.sign(DocumentKind::Report, "000000000000000000000000", &claims(Role::Perito)).await;
        assert!(matches!(result, Err(OdontoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_edit_after_signing_detected_only_cryptographically() {
        let (service, store) = service();
        let id = finalized_report(&store).await;
        let outcome = service.sign(DocumentKind::Report, &id, &claims(Role::Perito)).await.unwrap();

        assert!(store.overwrite_text(DocumentKind::Report, &id, Some("Edited body"), None));

        let strong = service.verify(DocumentKind::Report, &id, &claims(Role::Perito)).await.unwrap();
        assert_eq!(strong.result.reason, Some(VerificationFailure::ContentMismatch));

        let weak = service
            .public_verify(&id, &outcome.signature.content_hash, &outcome.signature.verification_code)
            .await
            .unwrap();
        assert!(weak.result.valid);
        assert_eq!(weak.verification_level, VerificationLevel::Code);
    }

    #[tokio::test]
    async fn test_public_verify_finds_evidence_reports() {
        let (service, store) = service();
        let mut evidence = EvidenceReportDoc::new("ev-1".into(), "Bite mark".into(), "Body".into(), "u1".into());
        evidence.status = DocumentStatus::Finalized;
        let id = store.insert(StoredDocument::EvidenceReport(evidence)).await.unwrap();

        let outcome = service
            .sign(DocumentKind::EvidenceReport, &id, &claims(Role::Perito))
            .await
            .unwrap();
        let public = service
            .public_verify(&id, &outcome.signature.content_hash, "WRONGCOD")
            .await
            .unwrap();

        assert!(!public.result.valid);
        assert_eq!(public.result.reason, Some(VerificationFailure::InvalidCode));
        assert_eq!(public.document_kind, Some(DocumentKind::EvidenceReport));
    }

    #[tokio::test]
    async fn test_unknown_document_is_not_found_result() {
        let (service, _) = service();

        let public = service.public_verify("nope", "h", "c").await.unwrap();
        assert_eq!(public.result.reason, Some(VerificationFailure::DocumentNotFound));
        assert_eq!(public.document_kind, None);

        let strong = service.verify(DocumentKind::Report, "nope", &claims(Role::Perito)).await.unwrap();
        assert_eq!(strong.result.reason, Some(VerificationFailure::DocumentNotFound));
    }

    #[tokio::test]
    async fn test_uppercase_id_yields_verifiable_url() {
        let (service, store) = service();
        let id = finalized_report(&store).await;
        let upper = id.to_uppercase();

        let outcome = service.sign(DocumentKind::Report, &upper, &claims(Role::Perito)).await.unwrap();
        let url_id = outcome
            .verification_url
            .split("/verify/")
            .nth(1)
            .and_then(|rest| rest.split('?').next())
            .unwrap();
        assert_eq!(url_id, id);

        let hash = &outcome.signature.content_hash;
        let code = &outcome.signature.verification_code;
        assert!(service.public_verify(url_id, hash, code).await.unwrap().result.valid);
        assert!(service.public_verify(&upper, hash, code).await.unwrap().result.valid);
    }
}
