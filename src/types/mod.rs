//! Shared types for odontolegal

mod error;

pub use error::{OdontoError, Result};
