//! Lifecycle status shared by reports and evidence reports

use serde::{Deserialize, Serialize};
use std::fmt;

/// Report lifecycle.
///
/// `draft` → `finalized` → `signed`. Only finalized documents can be signed
/// and `signed` is terminal.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Draft,
    Finalized,
    Signed,
    Archived,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Finalized => "finalized",
            DocumentStatus::Signed => "signed",
            DocumentStatus::Archived => "archived",
        }
    }

    /// Whether a document in this state may be signed
    pub fn is_signable(&self) -> bool {
        matches!(self, DocumentStatus::Finalized)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
