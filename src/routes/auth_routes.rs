//! HTTP routes for authentication
//!
//! - POST /auth/login    - Authenticate and get a session token
//! - GET  /auth/me       - Current identity from the token

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{verify_password, Claims, Role, SessionToken, TokenInput};
use crate::db::schemas::UserDoc;
use crate::routes::response::{
    authenticate, cors_preflight, error_response, json_response, method_not_allowed,
    parse_json_body, BoxBody, ErrorResponse,
};
use crate::server::AppState;
use crate::types::OdontoError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Honored only in dev mode without a database
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub can_sign: bool,
}

impl From<&Claims> for UserInfo {
    fn from(claims: &Claims) -> Self {
        Self {
            id: claims.user_id.clone(),
            name: claims.name.clone(),
            email: claims.email.clone(),
            role: claims.role,
            can_sign: claims.role.can_sign(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
    /// Unix timestamp
    pub expires_at: u64,
}

fn invalid_credentials() -> Response<BoxBody> {
    json_response(
        StatusCode::UNAUTHORIZED,
        &ErrorResponse {
            error: "Invalid credentials".into(),
            code: Some("INVALID_CREDENTIALS".into()),
        },
    )
}

/// Issue a session token and wrap it in the login response
fn auth_response(state: &AppState, input: TokenInput) -> Response<BoxBody> {
    match state.jwt.issue(input) {
        Ok(SessionToken { token, claims }) => json_response(
            StatusCode::OK,
            &AuthResponse {
                user: UserInfo::from(&claims),
                expires_at: claims.exp,
                token,
            },
        ),
        Err(e) => error_response(&e),
    }
}

/// POST /auth/login
async fn handle_login(req: Request<hyper::body::Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    if body.email.is_empty() || body.password.is_empty() {
        return error_response(&OdontoError::BadRequest(
            "Missing required fields: email, password".into(),
        ));
    }

    let mongo = match &state.mongo {
        Some(m) => m,
        None if state.args.dev_mode => {
            // Dev mode without MongoDB accepts any credentials
            let role = body.role.unwrap_or(Role::Perito);
            info!("Dev mode login (no MongoDB): {} as {}", body.email, role);
            let name = body.email.split('@').next().unwrap_or(&body.email).to_string();
            return auth_response(
                &state,
                TokenInput {
                    user_id: format!("dev-{}", body.email),
                    name,
                    email: body.email,
                    role,
                },
            );
        }
        None => {
            return error_response(&OdontoError::Database("Database not available".into()))
        }
    };

    let users = match mongo.collection::<UserDoc>().await {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    let user = match users
        .find_one(doc! { "email": &body.email, "is_active": true })
        .await
    {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!("Login failed - user not found: {}", body.email);
            return invalid_credentials();
        }
        Err(e) => return error_response(&e),
    };

    match verify_password(&body.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            warn!("Login failed - invalid password: {}", body.email);
            return invalid_credentials();
        }
        Err(e) => {
            warn!("Password verification error: {}", e);
            return error_response(&e);
        }
    }

    info!("Login successful: {}", body.email);

    auth_response(
        &state,
        TokenInput {
            user_id: user.id_hex(),
            name: user.name,
            email: user.email,
            role: user.role,
        },
    )
}

/// GET /auth/me
fn handle_me(req: &Request<hyper::body::Incoming>, state: &AppState) -> Response<BoxBody> {
    match authenticate(req, &state.jwt) {
        Ok(claims) => json_response(StatusCode::OK, &UserInfo::from(&claims)),
        Err(e) => error_response(&e),
    }
}

/// Handle auth-related HTTP requests.
///
/// Returns Some(response) if request was handled, None if not an auth route.
pub async fn handle_auth_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if !path.starts_with("/auth") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let response = match (&method, path.as_str()) {
        (&Method::POST, "/auth/login") => handle_login(req, state).await,
        (&Method::GET, "/auth/me") => handle_me(&req, &state),

        (_, "/auth/login") | (_, "/auth/me") => method_not_allowed(),

        _ => json_response(
            StatusCode::NOT_FOUND,
            &ErrorResponse {
                error: "Auth endpoint not found".into(),
                code: None,
            },
        ),
    };

    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_role_optional() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.c","password":"pw"}"#).unwrap();
        assert!(req.role.is_none());

        let req: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.c","password":"pw","role":"assistente"}"#).unwrap();
        assert_eq!(req.role, Some(Role::Assistente));
    }

    #[test]
    fn test_user_info_from_claims() {
        let claims = Claims {
            user_id: "u1".into(),
            name: "Dr. X".into(),
            email: "x@y.com".into(),
            role: Role::Assistente,
            iat: 0,
            exp: 10,
        };
        let info = UserInfo::from(&claims);
        assert!(!info.can_sign);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["canSign"], false);
        assert_eq!(json["role"], "assistente");
    }
}
