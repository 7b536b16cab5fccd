//! Logging infrastructure for odontolegal
//!
//! Provides the JSONL audit trail for signing and verification events.

pub mod audit;

pub use audit::{AuditEvent, AuditEventType, AuditLogger};
