//! Signable document store
//!
//! The signing service only needs two things from storage: fetch a document
//! by id, and atomically record a signature. Recording is conditional on the
//! document being `finalized` and unsigned, so two concurrent sign requests
//! cannot both succeed.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{DocumentStatus, EvidenceReportDoc, ReportDoc};
use crate::signature::{DigitalSignature, Signable};
use crate::types::OdontoError;

/// Which collection a signable document lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Report,
    EvidenceReport,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Report => "report",
            DocumentKind::EvidenceReport => "evidence_report",
        }
    }

    /// Map the URL collection segment (`reports`, `evidence-reports`)
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        match segment {
            "reports" => Some(DocumentKind::Report),
            "evidence-reports" => Some(DocumentKind::EvidenceReport),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lowercase-hex form of an ObjectId string; other ids pass through.
///
/// MongoDB accepts either hex case on lookup while documents hash and
/// verify against the lowercase form.
pub fn canonical_id(id: &str) -> String {
    match ObjectId::parse_str(id) {
        Ok(oid) => oid.to_hex(),
        Err(_) => id.to_string(),
    }
}

/// A report or evidence report as loaded from storage
#[derive(Debug, Clone, PartialEq)]
pub enum StoredDocument {
    Report(ReportDoc),
    EvidenceReport(EvidenceReportDoc),
}

impl StoredDocument {
    pub fn kind(&self) -> DocumentKind {
        match self {
            StoredDocument::Report(_) => DocumentKind::Report,
            StoredDocument::EvidenceReport(_) => DocumentKind::EvidenceReport,
        }
    }

    pub fn status(&self) -> DocumentStatus {
        match self {
            StoredDocument::Report(r) => r.status,
            StoredDocument::EvidenceReport(r) => r.status,
        }
    }

    fn inner(&self) -> &dyn Signable {
        match self {
            StoredDocument::Report(r) => r,
            StoredDocument::EvidenceReport(r) => r,
        }
    }
}

impl Signable for StoredDocument {
    fn document_id(&self) -> String {
        self.inner().document_id()
    }

    fn content(&self) -> &str {
        self.inner().content()
    }

    fn conclusion(&self) -> Option<&str> {
        self.inner().conclusion()
    }

    fn title(&self) -> Option<&str> {
        self.inner().title()
    }

    fn digital_signature(&self) -> Option<&DigitalSignature> {
        self.inner().digital_signature()
    }
}

/// Storage seam for signable documents
#[async_trait]
pub trait SignableStore: Send + Sync {
    /// Fetch a document. Unknown or malformed ids yield `Ok(None)`.
    async fn find(&self, kind: DocumentKind, id: &str) -> Result<Option<StoredDocument>, OdontoError>;

    /// Record a signature and move the document to `signed`.
    ///
    /// Must succeed at most once per document: fails with
    /// [`OdontoError::Conflict`] unless the document is currently
    /// `finalized` with no signature.
    async fn mark_signed(
        &self,
        kind: DocumentKind,
        id: &str,
        signature: &DigitalSignature,
    ) -> Result<(), OdontoError>;

    /// Insert a document and return its id
    async fn insert(&self, document: StoredDocument) -> Result<String, OdontoError>;

    /// Short label for health output
    fn backend(&self) -> &'static str;
}

/// MongoDB-backed store
#[derive(Clone)]
pub struct MongoSignableStore {
    reports: MongoCollection<ReportDoc>,
    evidence_reports: MongoCollection<EvidenceReportDoc>,
}

impl MongoSignableStore {
    pub async fn new(mongo: &MongoClient) -> Result<Self, OdontoError> {
        Ok(Self {
            reports: mongo.collection::<ReportDoc>().await?,
            evidence_reports: mongo.collection::<EvidenceReportDoc>().await?,
        })
    }
}

#[async_trait]
impl SignableStore for MongoSignableStore {
    async fn find(&self, kind: DocumentKind, id: &str) -> Result<Option<StoredDocument>, OdontoError> {
        let found = match kind {
            DocumentKind::Report => self.reports.find_by_id(id).await?.map(StoredDocument::Report),
            DocumentKind::EvidenceReport => self
                .evidence_reports
                .find_by_id(id)
                .await?
                .map(StoredDocument::EvidenceReport),
        };
        Ok(found)
    }

    async fn mark_signed(
        &self,
        kind: DocumentKind,
        id: &str,
        signature: &DigitalSignature,
    ) -> Result<(), OdontoError> {
        let oid = ObjectId::parse_str(id)
            .map_err(|_| OdontoError::NotFound(format!("{} {}", kind, id)))?;

        let filter = doc! {
            "_id": oid,
            "status": DocumentStatus::Finalized.as_str(),
            "digitalSignature": null,
        };
        let update = doc! {
            "$set": {
                "status": DocumentStatus::Signed.as_str(),
                "digitalSignature": bson::to_bson(signature)?,
                "metadata.updated_at": DateTime::now(),
            }
        };

        let result = match kind {
            DocumentKind::Report => self.reports.update_one(filter, update).await?,
            DocumentKind::EvidenceReport => self.evidence_reports.update_one(filter, update).await?,
        };

        if result.matched_count == 0 {
            warn!(kind = %kind, id = %id, "Conditional sign update matched nothing");
            return Err(OdontoError::Conflict(format!(
                "{} {} is not finalized or is already signed",
                kind, id
            )));
        }

        debug!(kind = %kind, id = %id, "Signature persisted");
        Ok(())
    }

    async fn insert(&self, document: StoredDocument) -> Result<String, OdontoError> {
        let oid = match document {
            StoredDocument::Report(r) => self.reports.insert_one(r).await?,
            StoredDocument::EvidenceReport(r) => self.evidence_reports.insert_one(r).await?,
        };
        Ok(oid.to_hex())
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_path_segment() {
        assert_eq!(DocumentKind::from_path_segment("reports"), Some(DocumentKind::Report));
        assert_eq!(
            DocumentKind::from_path_segment("evidence-reports"),
            Some(DocumentKind::EvidenceReport)
        );
        assert_eq!(DocumentKind::from_path_segment("patients"), None);
    }

    #[test]
    fn test_stored_document_delegates() {
        let mut report = ReportDoc::new("c1".into(), "Laudo".into(), "Body".into(), "u1".into());
        report.conclusion = Some("Match".into());
        report.id = Some(ObjectId::new());
        let hex = report.id.unwrap().to_hex();

        let stored = StoredDocument::Report(report);
        assert_eq!(stored.kind(), DocumentKind::Report);
        assert_eq!(stored.document_id(), hex);
        assert_eq!(stored.content(), "Body");
        assert_eq!(stored.conclusion(), Some("Match"));
        assert_eq!(stored.title(), Some("Laudo"));
        assert_eq!(stored.status(), DocumentStatus::Draft);
    }
}
