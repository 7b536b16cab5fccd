//! Forensic report schema
//!
//! Reports are the main signable document: an examiner's written findings
//! and conclusion for a case.

use bson::oid::ObjectId;
use mongodb::IndexModel;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{ascending_index, MongoSchema};
use crate::db::schemas::{DocumentStatus, Metadata};
use crate::signature::{DigitalSignature, Signable};

/// Collection name for reports
pub const REPORT_COLLECTION: &str = "reports";

/// Report document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Owning case
    pub case_id: String,

    pub title: String,

    pub content: String,

    #[serde(default)]
    pub conclusion: Option<String>,

    #[serde(default)]
    pub status: DocumentStatus,

    /// Author's user id
    pub created_by: String,

    /// Set exactly once, when the report is signed
    #[serde(default)]
    pub digital_signature: Option<DigitalSignature>,
}

impl ReportDoc {
    /// Create a new draft report
    pub fn new(case_id: String, title: String, content: String, created_by: String) -> Self {
        Self {
            id: None,
            metadata: Metadata::new(),
            case_id,
            title,
            content,
            conclusion: None,
            status: DocumentStatus::Draft,
            created_by,
            digital_signature: None,
        }
    }
}

impl Signable for ReportDoc {
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

impl MongoSchema for ReportDoc {
    const COLLECTION: &'static str = REPORT_COLLECTION;

    fn indexes() -> Vec<IndexModel> {
        vec![
            ascending_index("caseId", "case_id_index", false),
            ascending_index("status", "status_index", false),
        ]
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
