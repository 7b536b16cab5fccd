//! Signature audit trail
//!
//! Appends one JSON object per line for every signing and verification
//! attempt. The file is opened in append mode and flushed after each event,
//! so a crash loses at most the event being written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::db::DocumentKind;
use crate::signature::VerificationResult;

/// Audit event types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// Signature issued and persisted
    DocumentSigned,
    /// Authenticated cryptographic verification
    SignatureVerified,
    /// Public hash + code verification
    PublicVerification,
    /// Sign request refused (role, state, or lost race)
    SignRejected,
}

/// One line of the audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    /// Service instance that handled the request
    pub instance_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_kind: Option<DocumentKind>,
    pub document_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    /// Failure reason or rejection cause
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType, instance_id: String, document_id: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            instance_id,
            document_kind: None,
            document_id: document_id.to_string(),
            user_id: None,
            valid: None,
            reason: None,
            content_hash: None,
        }
    }

    pub fn with_kind(mut self, kind: DocumentKind) -> Self {
        self.document_kind = Some(kind);
        self
    }

    pub fn with_user(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_content_hash(mut self, hash: &str) -> Self {
        self.content_hash = Some(hash.to_string());
        self
    }

    /// Copy validity and failure reason from a verification outcome
    pub fn with_outcome(mut self, result: &VerificationResult) -> Self {
        self.valid = Some(result.valid);
        self.reason = result.reason.map(|r| r.to_string());
        self
    }

    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Audit logger writing JSONL events to an optional file.
///
/// Without a file every event is still emitted as a `tracing` record under
/// the `audit` target.
#[derive(Clone)]
pub struct AuditLogger {
    inner: Arc<Mutex<AuditLoggerInner>>,
    instance_id: String,
}

struct AuditLoggerInner {
    writer: Option<BufWriter<File>>,
}

impl AuditLogger {
    pub fn new(instance_id: String) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AuditLoggerInner {
                writer: None,
            })),
            instance_id,
        }
    }

    /// Start appending events to `path`
    pub async fn init_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut inner = self.inner.lock().await;
        inner.writer = Some(BufWriter::new(file));

        info!("Audit logging initialized to {}", path.display());
        Ok(())
    }

    pub async fn log(&self, event: AuditEvent) {
        let jsonl = match event.to_jsonl() {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize audit event: {}", e);
                return;
            }
        };

        info!(target: "audit", "{}", jsonl);

        let mut inner = self.inner.lock().await;
        if let Some(ref mut writer) = inner.writer {
            if let Err(e) = writeln!(writer, "{}", jsonl) {
                error!("Failed to write audit event: {}", e);
            }
            if let Err(e) = writer.flush() {
                error!("Failed to flush audit log: {}", e);
            }
        }
    }

    pub async fn log_signed(
        &self,
        kind: DocumentKind,
        document_id: &str,
        user_id: &str,
        content_hash: &str,
    ) {
        let event = self
            .event(AuditEventType::DocumentSigned, document_id)
            .with_kind(kind)
            .with_user(user_id)
            .with_content_hash(content_hash);
        self.log(event).await;
    }

    pub async fn log_sign_rejected(
        &self,
        kind: DocumentKind,
        document_id: &str,
        user_id: &str,
        reason: &str,
    ) {
        let event = self
            .event(AuditEventType::SignRejected, document_id)
            .with_kind(kind)
            .with_user(user_id)
            .with_reason(reason);
        self.log(event).await;
    }

    pub async fn log_verified(
        &self,
        kind: DocumentKind,
        document_id: &str,
        user_id: &str,
        result: &VerificationResult,
    ) {
        let event = self
            .event(AuditEventType::SignatureVerified, document_id)
            .with_kind(kind)
            .with_user(user_id)
            .with_outcome(result);
        self.log(event).await;
    }

    pub async fn log_public_verification(
        &self,
        kind: Option<DocumentKind>,
        document_id: &str,
        result: &VerificationResult,
    ) {
        let mut event = self
            .event(AuditEventType::PublicVerification, document_id)
            .with_outcome(result);
        event.document_kind = kind;
        self.log(event).await;
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    fn event(&self, event_type: AuditEventType, document_id: &str) -> AuditEvent {
        AuditEvent::new(event_type, self.instance_id.clone(), document_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::VerificationFailure;

    #[test]
    fn test_event_serialization() {
        let event = AuditEvent::new(AuditEventType::DocumentSigned, "i-1".into(), "abc123")
            .with_kind(DocumentKind::EvidenceReport)
            .with_user("u1")
            .with_content_hash("deadbeef");

        let jsonl = event.to_jsonl().unwrap();
        assert!(jsonl.contains("document_signed"));
        assert!(jsonl.contains("evidence_report"));
        assert!(jsonl.contains("deadbeef"));
        assert!(!jsonl.contains("\"valid\""));
    }

    #[test]
    fn test_outcome_reason() {
        let result = VerificationResult::invalid(VerificationFailure::InvalidCode);
        let event = AuditEvent::new(AuditEventType::PublicVerification, "i-1".into(), "abc123")
            .with_outcome(&result);

        assert_eq!(event.valid, Some(false));
        assert_eq!(event.reason.as_deref(), Some("INVALID_CODE"));
    }

    #[tokio::test]
    async fn test_file_logging_appends_lines() {
        let path = std::env::temp_dir().join(format!("odontolegal-audit-{}.jsonl", uuid::Uuid::new_v4()));
        let logger = AuditLogger::new("i-1".into());
        logger.init_file(path.clone()).await.unwrap();

        logger.log_signed(DocumentKind::Report, "r1", "u1", "h1").await;
        logger.log_sign_rejected(DocumentKind::Report, "r1", "u2", "already signed").await;

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("document_signed"));
        assert!(lines[1].contains("sign_rejected"));

        let _ = std::fs::remove_file(path);
    }
}
