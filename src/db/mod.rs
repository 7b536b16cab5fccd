//! Database layer for odontolegal
//!
//! MongoDB storage for users, reports and evidence reports, plus the
//! [`SignableStore`] seam the signing service talks to. An in-memory store
//! backs dev mode when MongoDB is unavailable.

pub mod memory;
pub mod mongo;
pub mod schemas;
pub mod store;

pub use memory::MemorySignableStore;
pub use mongo::{MongoClient, MongoCollection};
pub use schemas::{DocumentStatus, EvidenceReportDoc, Metadata, ReportDoc, UserDoc};
pub use store::{canonical_id, DocumentKind, MongoSignableStore, SignableStore, StoredDocument};
