//! Database schemas for odontolegal
//!
//! Defines MongoDB document structures for users and signable reports.

mod evidence_report;
mod metadata;
mod report;
mod status;
mod user;

pub use evidence_report::{EvidenceReportDoc, EVIDENCE_REPORT_COLLECTION};
pub use metadata::Metadata;
pub use report::{ReportDoc, REPORT_COLLECTION};
pub use status::DocumentStatus;
pub use user::{UserDoc, USER_COLLECTION};
