//! Signature engine
//!
//! Issues and verifies signing assertions for reports.
//!
//! Security notes:
//! - Assertions are signed with HS256 (HMAC-SHA256)
//! - Validity defaults to 100 years; forensic signatures must stay verifiable
//! - The secret is injected at construction, never read from the environment here

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use super::age::human_relative_time;
use super::code::generate_verification_code;
use super::hash::content_hash;
use super::types::{
    DigitalSignature, Signable, Signer, SigningAssertion, VerificationFailure, VerificationResult,
    VerifiedDocument,
};
use crate::types::OdontoError;

/// Default validity window for signing assertions
pub const DEFAULT_VALIDITY_YEARS: u32 = 100;

/// Upper bound on the validity window
pub const MAX_VALIDITY_YEARS: u32 = 1000;

/// Minimum accepted secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

const SECONDS_PER_YEAR: i64 = 31_557_600; // 365.25 days

/// Signs documents and verifies their signatures.
///
/// Stateless apart from the key material, so it is shared behind an `Arc`
/// and used concurrently without locking.
#[derive(Clone)]
pub struct SignatureEngine {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
}

impl SignatureEngine {
    /// Create a new engine
    ///
    /// Returns an error if the secret is empty or too short, or the validity
    /// window is zero or above [`MAX_VALIDITY_YEARS`].
    pub fn new(secret: &str, validity_years: u32) -> Result<Self, OdontoError> {
        if secret.is_empty() {
            return Err(OdontoError::Config("SIGNING_SECRET is required".into()));
        }

        if secret.len() < MIN_SECRET_LEN {
            return Err(OdontoError::Config(format!(
                "SIGNING_SECRET must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }

        if validity_years == 0 {
            return Err(OdontoError::Config(
                "Signature validity must be at least one year".into(),
            ));
        }

        if validity_years > MAX_VALIDITY_YEARS {
            return Err(OdontoError::Config(format!(
                "Signature validity must not exceed {} years",
                MAX_VALIDITY_YEARS
            )));
        }

        Ok(Self::from_parts(secret, validity_years))
    }

    /// Create an engine for dev mode (fixed, publicly known secret)
    pub fn new_dev() -> Self {
        Self::from_parts(
            "dev-mode-signing-secret-not-for-production-use",
            DEFAULT_VALIDITY_YEARS,
        )
    }

    fn from_parts(secret: &str, validity_years: u32) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validity: Duration::seconds(i64::from(validity_years) * SECONDS_PER_YEAR),
        }
    }

    /// Sign a document on behalf of `signer`.
    ///
    /// Pure computation: persisting the returned signature and moving the
    /// document to the signed state is the caller's job.
    pub fn sign_document<D: Signable + ?Sized>(
        &self,
        document: &D,
        signer: &Signer,
    ) -> Result<DigitalSignature, OdontoError> {
        self.sign_document_at(document, signer, Utc::now())
    }

    pub(crate) fn sign_document_at<D: Signable + ?Sized>(
        &self,
        document: &D,
        signer: &Signer,
        now: DateTime<Utc>,
    ) -> Result<DigitalSignature, OdontoError> {
        let document_id = document.document_id();
        if document_id.trim().is_empty() {
            return Err(OdontoError::InvalidInput("Document id is required".into()));
        }
        if signer.id.trim().is_empty() {
            return Err(OdontoError::InvalidInput("Signer id is required".into()));
        }

        let hash = content_hash(&document_id, document.content(), document.conclusion());
        let signature_date = now.trunc_subsecs(3);
        let iat = signature_date.timestamp();

        let assertion = SigningAssertion {
            document_id: document_id.clone(),
            content_hash: hash.clone(),
            signed_by: signer.clone(),
            signature_date,
            iat: iat.max(0) as u64,
            exp: (iat + self.validity.num_seconds()).max(0) as u64,
        };

        let token = encode(&Header::new(Algorithm::HS256), &assertion, &self.encoding_key)
            .map_err(|e| OdontoError::Internal(format!("Failed to encode signature: {}", e)))?;

        debug!(document_id = %document_id, signer = %signer.id, "Document signed");

        Ok(DigitalSignature {
            signed_by: signer.id.clone(),
            signature_date,
            signature_data: token,
            content_hash: hash,
            verification_code: generate_verification_code(),
        })
    }

    /// Verify a signature against the document's current content.
    ///
    /// This is the strong check: it authenticates the token with the secret
    /// and recomputes the hash, so any edit since signing is detected.
    pub fn verify_signature<D: Signable + ?Sized>(
        &self,
        document: &D,
        signature: Option<&DigitalSignature>,
    ) -> VerificationResult {
        self.verify_signature_at(document, signature, Utc::now())
    }

    pub(crate) fn verify_signature_at<D: Signable + ?Sized>(
        &self,
        document: &D,
        signature: Option<&DigitalSignature>,
        now: DateTime<Utc>,
    ) -> VerificationResult {
        let signature = match signature {
            Some(s) if !s.signature_data.is_empty() => s,
            _ => return VerificationResult::invalid(VerificationFailure::NoSignature),
        };

        let assertion = match self.decode_assertion(&signature.signature_data) {
            Ok(a) => a,
            Err(message) => {
                return VerificationResult::invalid(VerificationFailure::InvalidToken)
                    .with_message(message)
            }
        };

        let document_id = document.document_id();
        let current_hash = content_hash(&document_id, document.content(), document.conclusion());

        let content_matches = assertion.content_hash == current_hash;
        let document_matches = assertion.document_id == document_id;

        if !content_matches {
            let result = VerificationResult::content_mismatch(assertion.content_hash, current_hash);
            return if document_matches {
                result
            } else {
                result.with_message(
                    "Document content was modified after signing and the signature belongs to a different document",
                )
            };
        }

        if !document_matches {
            return VerificationResult::invalid(VerificationFailure::DocumentMismatch);
        }

        let age = human_relative_time(assertion.signature_date, now);
        VerificationResult::verified(assertion.signed_by, assertion.signature_date, age)
    }

    /// Public verification from a printed hash and code.
    ///
    /// Weaker than [`verify_signature`](Self::verify_signature): it compares
    /// the supplied values with what was stored at signing time and never
    /// recomputes the hash from current content, so it cannot detect edits
    /// made after signing. No secret is involved.
    pub fn verify_document_by_hash<D: Signable + ?Sized>(
        &self,
        document_id: &str,
        hash: &str,
        verification_code: &str,
        document: Option<&D>,
    ) -> VerificationResult {
        verify_document_by_hash_at(document_id, hash, verification_code, document, Utc::now())
    }

    fn decode_assertion(&self, token: &str) -> Result<SigningAssertion, &'static str> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);

        decode::<SigningAssertion>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                use jsonwebtoken::errors::ErrorKind;
                match err.kind() {
                    ErrorKind::ExpiredSignature => "Signature assertion expired",
                    ErrorKind::InvalidSignature => "Invalid signature",
                    ErrorKind::InvalidAlgorithm => "Unexpected signature algorithm",
                    ErrorKind::InvalidToken | ErrorKind::Base64(_) => "Malformed signature token",
                    ErrorKind::Json(_) | ErrorKind::Utf8(_) => "Corrupt signature payload",
                    _ => "Signature validation failed",
                }
            })
    }
}

pub(crate) fn verify_document_by_hash_at<D: Signable + ?Sized>(
    document_id: &str,
    hash: &str,
    verification_code: &str,
    document: Option<&D>,
    now: DateTime<Utc>,
) -> VerificationResult {
    let document = match document {
        Some(d) if d.document_id() == document_id => d,
        _ => return VerificationResult::invalid(VerificationFailure::DocumentNotFound),
    };

    let signature = match document.digital_signature() {
        Some(s) => s,
        None => return VerificationResult::invalid(VerificationFailure::NoSignature),
    };

    if signature.verification_code != verification_code {
        return VerificationResult::invalid(VerificationFailure::InvalidCode);
    }

    if signature.content_hash != hash {
        return VerificationResult::invalid(VerificationFailure::ContentMismatch);
    }

    VerificationResult::verified_document(VerifiedDocument {
        id: document_id.to_string(),
        title: document.title().map(str::to_string),
        signed_by: signature.signed_by.clone(),
        signature_date: signature.signature_date,
        age: human_relative_time(signature.signature_date, now),
    })
}
