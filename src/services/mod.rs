//! Services for odontolegal

pub mod signing;

pub use signing::{SignOutcome, SigningService, VerificationLevel, VerificationResponse};
