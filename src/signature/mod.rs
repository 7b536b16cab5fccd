//! Digital signatures for forensic reports
//!
//! Signs reports and evidence reports so that any later edit to their text
//! can be proven. A signature binds three things together:
//!
//! - the document identity,
//! - a SHA-256 content hash over `id ++ content ++ conclusion`,
//! - the signer identity (id, name, email, role).
//!
//! The binding is an HS256 JSON Web Token with a validity window measured in
//! decades. Alongside the token, each signature carries a short
//! [verification code](code) that can be printed on an exported PDF together
//! with the content hash.
//!
//! # Verification paths
//!
//! ```text
//!  verify_signature            verify_document_by_hash
//!  (authenticated)             (public /verify/{id})
//!        │                            │
//!        ▼                            ▼
//!  decode token with secret    compare printed code
//!        │                            │
//!        ▼                            ▼
//!  recompute hash from         compare printed hash
//!  CURRENT content             with STORED hash
//!        │                            │
//!        ▼                            ▼
//!  detects tampering           only proves the printout
//!  since signing               matches what was stored
//! ```
//!
//! The public path never recomputes the hash, so it cannot detect edits made
//! after signing. It exists for manual checks by third parties who hold only a
//! printed extract.

pub mod age;
pub mod code;
pub mod engine;
pub mod hash;
pub mod types;
pub mod url;

pub use age::human_relative_time;
pub use code::{generate_verification_code, is_well_formed_code, VERIFICATION_ALPHABET, VERIFICATION_CODE_LEN};
pub use engine::{SignatureEngine, DEFAULT_VALIDITY_YEARS, MAX_VALIDITY_YEARS, MIN_SECRET_LEN};
pub use hash::content_hash;
pub use types::{
    DigitalSignature, Signable, SignableDocument, Signer, SigningAssertion, VerificationFailure,
    VerificationResult, VerifiedDocument,
};
pub use url::verification_url;
