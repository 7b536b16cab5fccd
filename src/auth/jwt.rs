//! Session tokens
//!
//! Bearer tokens identifying the examiner behind a request. They carry the
//! identity that ends up in a report signature, but they are short-lived and
//! keyed with `JWT_SECRET`; report signatures themselves are issued by the
//! [`SignatureEngine`](crate::signature::SignatureEngine) with `SIGNING_SECRET`.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::signature::{Signer, MIN_SECRET_LEN};
use crate::types::OdontoError;

const DEV_SECRET: &str = "dev-mode-session-secret-not-for-production-use";
const DEV_EXPIRY_SECONDS: u64 = 3600;

/// Session token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id (MongoDB ObjectId hex)
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix seconds)
    pub iat: u64,
    /// Expires at (Unix seconds)
    pub exp: u64,
}

impl Claims {
    /// Identity to embed in a report signature
    pub fn signer(&self) -> Signer {
        Signer {
            id: self.user_id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.to_string(),
        }
    }
}

/// Identity a token is issued for
#[derive(Debug, Clone)]
pub struct TokenInput {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Encoded token together with the claims it carries
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub claims: Claims,
}

/// Issues and validates session tokens (HS256)
#[derive(Clone)]
pub struct JwtValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_seconds: u64,
}

impl JwtValidator {
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, OdontoError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(OdontoError::Config(format!(
                "JWT_SECRET must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }
        if expiry_seconds == 0 {
            return Err(OdontoError::Config(
                "JWT_EXPIRY_SECONDS must be positive".into(),
            ));
        }

        Ok(Self::from_secret(&secret, expiry_seconds))
    }

    /// Fixed, publicly known secret for dev mode
    pub fn new_dev() -> Self {
        Self::from_secret(DEV_SECRET, DEV_EXPIRY_SECONDS)
    }

    fn from_secret(secret: &str, expiry_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
        }
    }

    pub fn issue(&self, input: TokenInput) -> Result<SessionToken, OdontoError> {
        let now = Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            user_id: input.user_id,
            name: input.name,
            email: input.email,
            role: input.role,
            iat: now,
            exp: now + self.expiry_seconds,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| OdontoError::Auth(format!("Failed to issue session token: {}", e)))?;

        Ok(SessionToken { token, claims })
    }

    /// Decode a token, failing with `Unauthorized` when it is forged or expired
    pub fn validate(&self, token: &str) -> Result<Claims, OdontoError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                use jsonwebtoken::errors::ErrorKind;
                let reason = match err.kind() {
                    ErrorKind::ExpiredSignature => "Session expired",
                    ErrorKind::InvalidSignature => "Session token signature mismatch",
                    _ => "Invalid session token",
                };
                OdontoError::Unauthorized(reason.into())
            })
    }
}

/// Token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let (scheme, token) = header?.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
