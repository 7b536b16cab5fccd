//! Odontolegal - signatures for forensic odontology reports
//!
//! Signs finalized reports and evidence reports so that later edits can be
//! proven, and verifies them either cryptographically (authenticated) or from
//! the hash and code printed on an exported report (public).
//!
//! ## Components
//!
//! - **Signature**: content hashing, signing assertions, verification codes
//! - **Store**: MongoDB or in-memory storage with at-most-once signing
//! - **Auth**: session tokens, roles, password hashing
//! - **Server**: hyper HTTP surface for signing and verification
//! - **Audit**: JSONL trail of signing and verification events

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod routes;
pub mod server;
pub mod services;
pub mod signature;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use signature::{SignatureEngine, VerificationResult};
pub use types::{OdontoError, Result};
