//! Signature data model
//!
//! Shapes produced and consumed by the [`SignatureEngine`](super::SignatureEngine).
//! All of them serialize with camelCase field names since they are embedded
//! into stored documents and returned over HTTP as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the person signing a document.
///
/// The engine trusts this identity; it is established by the authorization
/// layer before the engine is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Signature embedded into a report or evidence report once it is signed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalSignature {
    /// Signer's user id
    pub signed_by: String,
    /// When the document was signed
    pub signature_date: DateTime<Utc>,
    /// HS256 token carrying the [`SigningAssertion`]
    pub signature_data: String,
    /// Hex SHA-256 of the document content at signing time
    pub content_hash: String,
    /// Short code for manual verification
    pub verification_code: String,
}

/// Claims carried inside `signature_data`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningAssertion {
    pub document_id: String,
    pub content_hash: String,
    pub signed_by: Signer,
    pub signature_date: DateTime<Utc>,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Anything that can be signed: reports and evidence reports.
pub trait Signable {
    /// Stable identifier. An empty string means the document has no id yet.
    fn document_id(&self) -> String;

    fn content(&self) -> &str;

    fn conclusion(&self) -> Option<&str>;

    fn title(&self) -> Option<&str> {
        None
    }

    fn digital_signature(&self) -> Option<&DigitalSignature>;
}

/// Free-standing signable document, used when the caller holds plain values
/// rather than a stored schema type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignableDocument {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digital_signature: Option<DigitalSignature>,
}

impl SignableDocument {
    pub fn new(id: impl Into<String>, content: impl Into<String>, conclusion: Option<&str>) -> Self {
        Self {
            id: id.into(),
            title: None,
            content: content.into(),
            conclusion: conclusion.map(str::to_string),
            digital_signature: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl Signable for SignableDocument {
    fn document_id(&self) -> String {
        self.id.clone()
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn conclusion(&self) -> Option<&str> {
        self.conclusion.as_deref()
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn digital_signature(&self) -> Option<&DigitalSignature> {
        self.digital_signature.as_ref()
    }
}

/// Why a verification came back negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationFailure {
    /// Document has never been signed
    NoSignature,
    /// Token is corrupt, tampered with, or signed with another secret
    InvalidToken,
    /// Document text no longer matches the signed hash
    ContentMismatch,
    /// Token was issued for a different document
    DocumentMismatch,
    /// Supplied verification code does not match the stored one
    InvalidCode,
    /// No document with the requested id
    DocumentNotFound,
}

impl VerificationFailure {
    /// Human-readable explanation suitable for end users
    pub fn description(&self) -> &'static str {
        match self {
            Self::NoSignature => "Document has no digital signature",
            Self::InvalidToken => "Signature token is invalid",
            Self::ContentMismatch => "Document content was modified after signing",
            Self::DocumentMismatch => "Signature belongs to a different document",
            Self::InvalidCode => "Verification code does not match",
            Self::DocumentNotFound => "Document not found",
        }
    }
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NoSignature => "NO_SIGNATURE",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::ContentMismatch => "CONTENT_MISMATCH",
            Self::DocumentMismatch => "DOCUMENT_MISMATCH",
            Self::InvalidCode => "INVALID_CODE",
            Self::DocumentNotFound => "DOCUMENT_NOT_FOUND",
        };
        write!(f, "{}", s)
    }
}

/// Public summary of a document whose printed hash and code check out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedDocument {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub signed_by: String,
    pub signature_date: DateTime<Utc>,
    pub age: String,
}

/// Outcome of a verification.
///
/// Every failure mode is represented here; verification never returns `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<VerificationFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_by: Option<Signer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<VerifiedDocument>,
}

impl VerificationResult {
    /// Negative result with the default description as message
    pub fn invalid(reason: VerificationFailure) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            message: Some(reason.description().to_string()),
            expected_hash: None,
            current_hash: None,
            signed_by: None,
            signature_date: None,
            age: None,
            document: None,
        }
    }

    /// Replace the message with a more specific diagnostic
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Content hash differs from the signed one
    pub fn content_mismatch(expected_hash: String, current_hash: String) -> Self {
        Self {
            expected_hash: Some(expected_hash),
            current_hash: Some(current_hash),
            ..Self::invalid(VerificationFailure::ContentMismatch)
        }
    }

    /// Positive result from the cryptographic path
    pub fn verified(signed_by: Signer, signature_date: DateTime<Utc>, age: String) -> Self {
        Self {
            valid: true,
            reason: None,
            message: None,
            expected_hash: None,
            current_hash: None,
            signed_by: Some(signed_by),
            signature_date: Some(signature_date),
            age: Some(age),
            document: None,
        }
    }

    /// Positive result from the public hash+code path
    pub fn verified_document(document: VerifiedDocument) -> Self {
        Self {
            valid: true,
            reason: None,
            message: None,
            expected_hash: None,
            current_hash: None,
            signed_by: None,
            signature_date: None,
            age: None,
            document: Some(document),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_serializes_screaming_snake() {
        let json = serde_json::to_string(&VerificationFailure::ContentMismatch).unwrap();
        assert_eq!(json, r#""CONTENT_MISMATCH""#);
        assert_eq!(VerificationFailure::InvalidCode.to_string(), "INVALID_CODE");
    }

    #[test]
    fn test_invalid_result_skips_empty_fields() {
        let result = VerificationResult::invalid(VerificationFailure::NoSignature);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["reason"], "NO_SIGNATURE");
        assert!(json.get("expectedHash").is_none());
        assert!(json.get("document").is_none());
    }

    #[test]
    fn test_content_mismatch_carries_both_hashes() {
        let result = VerificationResult::content_mismatch("aa".into(), "bb".into());
        assert!(!result.valid);
        assert_eq!(result.reason, Some(VerificationFailure::ContentMismatch));
        assert_eq!(result.expected_hash.as_deref(), Some("aa"));
        assert_eq!(result.current_hash.as_deref(), Some("bb"));
    }

    #[test]
    fn test_digital_signature_camel_case() {
        let sig = DigitalSignature {
            signed_by: "u1".into(),
            signature_date: Utc::now(),
            signature_data: "token".into(),
            content_hash: "hash".into(),
            verification_code: "ABCDEFGH".into(),
        };
        let json = serde_json::to_value(&sig).unwrap();
        assert_eq!(json["signedBy"], "u1");
        assert_eq!(json["verificationCode"], "ABCDEFGH");
        assert!(json.get("signatureData").is_some());
    }
}
