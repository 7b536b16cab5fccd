//! In-memory signable store
//!
//! Used in dev mode when MongoDB is unreachable, and by tests. Holds the same
//! conditional-update contract as the MongoDB store: the check and the write
//! happen under the map's entry lock.

use async_trait::async_trait;
use bson::oid::ObjectId;
use dashmap::DashMap;

use crate::db::schemas::DocumentStatus;
use crate::db::store::{canonical_id, DocumentKind, SignableStore, StoredDocument};
use crate::signature::{DigitalSignature, Signable};
use crate::types::OdontoError;

/// Signable store backed by a concurrent hash map
#[derive(Default)]
pub struct MemorySignableStore {
    documents: DashMap<(DocumentKind, String), StoredDocument>,
}

fn key(kind: DocumentKind, id: &str) -> (DocumentKind, String) {
    (kind, canonical_id(id))
}

impl MemorySignableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Overwrite a stored document's text, bypassing lifecycle rules.
    ///
    /// Simulates out-of-band edits so tamper detection can be exercised.
    pub fn overwrite_text(
        &self,
        kind: DocumentKind,
        id: &str,
        content: Option<&str>,
        conclusion: Option<&str>,
    ) -> bool {
        let Some(mut entry) = self.documents.get_mut(&key(kind, id)) else {
            return false;
        };
        let (doc_content, doc_conclusion) = match entry.value_mut() {
            StoredDocument::Report(r) => (&mut r.content, &mut r.conclusion),
            StoredDocument::EvidenceReport(r) => (&mut r.content, &mut r.conclusion),
        };
        if let Some(c) = content {
            *doc_content = c.to_string();
        }
        if let Some(c) = conclusion {
            *doc_conclusion = Some(c.to_string());
        }
        true
    }
}

#[async_trait]
impl SignableStore for MemorySignableStore {
    async fn find(&self, kind: DocumentKind, id: &str) -> Result<Option<StoredDocument>, OdontoError> {
        Ok(self
            .documents
            .get(&key(kind, id))
            .map(|entry| entry.value().clone()))
    }

    async fn mark_signed(
        &self,
        kind: DocumentKind,
        id: &str,
        signature: &DigitalSignature,
    ) -> Result<(), OdontoError> {
        let mut entry = self
            .documents
            .get_mut(&key(kind, id))
            .ok_or_else(|| OdontoError::NotFound(format!("{} {}", kind, id)))?;

        let document = entry.value_mut();
        if !document.status().is_signable() || document.digital_signature().is_some() {
            return Err(OdontoError::Conflict(format!(
                "{} {} is not finalized or is already signed",
                kind, id
            )));
        }

        let (status, slot, metadata) = match document {
            StoredDocument::Report(r) => (&mut r.status, &mut r.digital_signature, &mut r.metadata),
            StoredDocument::EvidenceReport(r) => {
                (&mut r.status, &mut r.digital_signature, &mut r.metadata)
            }
        };
        *status = DocumentStatus::Signed;
        *slot = Some(signature.clone());
        metadata.touch();

        Ok(())
    }

    async fn insert(&self, mut document: StoredDocument) -> Result<String, OdontoError> {
        let id = match &mut document {
            StoredDocument::Report(r) => *r.id.get_or_insert_with(ObjectId::new),
            StoredDocument::EvidenceReport(r) => *r.id.get_or_insert_with(ObjectId::new),
        };
        let hex = id.to_hex();
        self.documents.insert((document.kind(), hex.clone()), document);
        Ok(hex)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::ReportDoc;
    use chrono::Utc;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn finalized_report() -> StoredDocument {
        let mut report = ReportDoc::new("case-7".into(), "Laudo".into(), "Body".into(), "u1".into());
        report.status = DocumentStatus::Finalized;
        StoredDocument::Report(report)
    }

    fn signature() -> DigitalSignature {
        DigitalSignature {
            signed_by: "u1".into(),
            signature_date: Utc::now(),
            signature_data: "token".into(),
            content_hash: "hash".into(),
            verification_code: "ABCDEFGH".into(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let store = MemorySignableStore::new();
        let id = store.insert(finalized_report()).await.unwrap();

        assert_eq!(id.len(), 24);
        assert_eq!(store.len(), 1);
        let found = store.find(DocumentKind::Report, &id).await.unwrap().unwrap();
        assert_eq!(found.document_id(), id);
        assert!(store.find(DocumentKind::EvidenceReport, &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lookup_ignores_object_id_case() {
        let store = MemorySignableStore::new();
        let id = store.insert(finalized_report()).await.unwrap();
        let upper = id.to_uppercase();

        let found = store.find(DocumentKind::Report, &upper).await.unwrap().unwrap();
        assert_eq!(found.document_id(), id);
        assert_ok!(store.mark_signed(DocumentKind::Report, &upper, &signature()).await);
    }

    #[tokio::test]
    async fn test_mark_signed_once() {
        let store = MemorySignableStore::new();
        let id = store.insert(finalized_report()).await.unwrap();

        assert_ok!(store.mark_signed(DocumentKind::Report, &id, &signature()).await);
        let doc = store.find(DocumentKind::Report, &id).await.unwrap().unwrap();
        assert_eq!(doc.status(), DocumentStatus::Signed);
        assert!(doc.digital_signature().is_some());

        let second = store.mark_signed(DocumentKind::Report, &id, &signature()).await;
        assert!(matches!(second, Err(OdontoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_draft_cannot_be_signed() {
        let store = MemorySignableStore::new();
        let draft = StoredDocument::Report(ReportDoc::new("c".into(), "t".into(), "b".into(), "u".into()));
        let id = store.insert(draft).await.unwrap();

        assert_err!(store.mark_signed(DocumentKind::Report, &id, &signature()).await);
    }

    #[tokio::test]
    async fn test_unknown_id_not_found() {
        let store = MemorySignableStore::new();
        assert!(store.is_empty());
        let result = store.mark_signed(DocumentKind::Report, "nope", &signature()).await;
        assert!(matches!(result, Err(OdontoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_sign_only_one_wins() {
        let store = Arc::new(MemorySignableStore::new());
        let id = store.insert(finalized_report()).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                store.mark_signed(DocumentKind::Report, &id, &signature()).await.is_ok()
            }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }
}
