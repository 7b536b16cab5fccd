//! Configuration for odontolegal
//!
//! CLI arguments with environment variable fallbacks, parsed with clap.
//! A `.env` file is loaded by `main` before parsing.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use uuid::Uuid;

use crate::auth::JwtValidator;
use crate::signature::{
    SignatureEngine, DEFAULT_VALIDITY_YEARS, MAX_VALIDITY_YEARS, MIN_SECRET_LEN,
};
use crate::types::OdontoError;

/// Odontolegal - signing and verification service for forensic dental reports
#[derive(Parser, Debug, Clone)]
#[command(name = "odontolegal")]
#[command(about = "Digital signatures and tamper detection for forensic odontology reports")]
pub struct Args {
    /// Unique identifier for this service instance
    #[arg(long, env = "INSTANCE_ID", default_value_t = Uuid::new_v4())]
    pub instance_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (dev secrets, in-memory store fallback)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "odontolegal")]
    pub mongodb_db: String,

    /// Secret for session tokens (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Session token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Secret for report signatures (required in production).
    /// Rotating it invalidates every existing signature.
    #[arg(long, env = "SIGNING_SECRET")]
    pub signing_secret: Option<String>,

    /// How long a report signature stays valid, in years
    #[arg(long, env = "SIGNATURE_VALIDITY_YEARS", default_value_t = DEFAULT_VALIDITY_YEARS)]
    pub signature_validity_years: u32,

    /// Public base URL used to build verification links
    #[arg(long, env = "PUBLIC_BASE_URL", default_value = "http://localhost:8080")]
    pub public_base_url: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Append signature audit events (JSONL) to this file
    #[arg(long, env = "AUDIT_LOG_PATH")]
    pub audit_log_path: Option<PathBuf>,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            check_secret("JWT_SECRET", self.jwt_secret.as_deref())?;
            check_secret("SIGNING_SECRET", self.signing_secret.as_deref())?;
        }

        if self.signature_validity_years == 0 {
            return Err("SIGNATURE_VALIDITY_YEARS must be at least 1".to_string());
        }

        if self.signature_validity_years > MAX_VALIDITY_YEARS {
            return Err(format!(
                "SIGNATURE_VALIDITY_YEARS must not exceed {}",
                MAX_VALIDITY_YEARS
            ));
        }

        if self.public_base_url.trim().is_empty() {
            return Err("PUBLIC_BASE_URL must not be empty".to_string());
        }

        Ok(())
    }

    /// Session token validator (dev secret in dev mode unless one is set)
    pub fn jwt_validator(&self) -> Result<JwtValidator, OdontoError> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => JwtValidator::new(secret.clone(), self.jwt_expiry_seconds),
            (None, true) => Ok(JwtValidator::new_dev()),
            (None, false) => Err(OdontoError::Config(
                "JWT_SECRET is required in production mode".into(),
            )),
        }
    }

    /// Signature engine (dev secret in dev mode unless one is set)
    pub fn signature_engine(&self) -> Result<SignatureEngine, OdontoError> {
        match (&self.signing_secret, self.dev_mode) {
            (Some(secret), _) => SignatureEngine::new(secret, self.signature_validity_years),
            (None, true) => Ok(SignatureEngine::new_dev()),
            (None, false) => Err(OdontoError::Config(
                "SIGNING_SECRET is required in production mode".into(),
            )),
        }
    }
}

fn check_secret(name: &str, secret: Option<&str>) -> Result<(), String> {
    match secret {
        None => Err(format!("{} is required in production mode", name)),
        Some(s) if s.len() < MIN_SECRET_LEN => {
            Err(format!("{} must be at least {} characters", name, MIN_SECRET_LEN))
        }
        Some(_) => Ok(()),
    }
}
