//! Evidence report schema
//!
//! A report attached to a single piece of evidence (radiograph, dental cast,
//! photograph). Signed the same way as case reports.

use bson::oid::ObjectId;
use mongodb::IndexModel;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{ascending_index, MongoSchema};
use crate::db::schemas::{DocumentStatus, Metadata};
use crate::signature::{DigitalSignature, Signable};

/// Collection name for evidence reports
pub const EVIDENCE_REPORT_COLLECTION: &str = "evidence_reports";

/// Evidence report document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceReportDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Evidence item this report describes
    pub evidence_id: String,

    pub title: String,

    pub content: String,

    #[serde(default)]
    pub conclusion: Option<String>,

    #[serde(default)]
    pub status: DocumentStatus,

    pub created_by: String,

    #[serde(default)]
    pub digital_signature: Option<DigitalSignature>,
}

impl EvidenceReportDoc {
    pub fn new(evidence_id: String, title: String, content: String, created_by: String) -> Self {
        Self {
            id: None,
            metadata: Metadata::new(),
            evidence_id,
            title,
            content,
            conclusion: None,
            status: DocumentStatus::Draft,
            created_by,
            digital_signature: None,
        }
    }
}

impl Signable for EvidenceReportDoc {
    fn document_id(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn conclusion(&self) -> Option<&str> {
        self.conclusion.as_deref()
    }

    fn title(&self) -> Option<&str> {
        Some(&self.title)
    }

    fn digital_signature(&self) -> Option<&DigitalSignature> {
        self.digital_signature.as_ref()
    }
}

impl MongoSchema for EvidenceReportDoc {
    const COLLECTION: &'static str = EVIDENCE_REPORT_COLLECTION;

    fn indexes() -> Vec<IndexModel> {
        vec![ascending_index("evidenceId", "evidence_id_index", false)]
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
