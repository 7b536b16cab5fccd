//! Shared HTTP response and request helpers

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::auth::{bearer_token, Claims, JwtValidator};
use crate::types::OdontoError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Maximum accepted JSON request body
const MAX_BODY_BYTES: usize = 10 * 1024;

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    full_body(Bytes::new())
}

fn add_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    let mut response = Response::new(full_body(json));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    add_cors_headers(headers);
    response
}

/// Map an error to its status code and a `{error, code}` body
pub fn error_response(err: &OdontoError) -> Response<BoxBody> {
    json_response(
        err.status_code(),
        &ErrorResponse {
            error: err.to_string(),
            code: Some(err.code().to_string()),
        },
    )
}

pub fn cors_preflight() -> Response<BoxBody> {
    let mut response = Response::new(empty_body());
    *response.status_mut() = StatusCode::NO_CONTENT;
    let headers = response.headers_mut();
    add_cors_headers(headers);
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    response
}

pub fn not_found(path: &str) -> Response<BoxBody> {
    error_response(&OdontoError::NotFound(format!("No route for {}", path)))
}

pub fn method_not_allowed() -> Response<BoxBody> {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &ErrorResponse {
            error: "Method not allowed".into(),
            code: None,
        },
    )
}

pub async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<hyper::body::Incoming>,
) -> Result<T, OdontoError> {
    let body = req
        .collect()
        .await
        .map_err(|e| OdontoError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > MAX_BODY_BYTES {
        return Err(OdontoError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes).map_err(|e| OdontoError::BadRequest(format!("Invalid JSON: {}", e)))
}

pub fn get_auth_header<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

/// Resolve the bearer token on a request into session claims
pub fn authenticate<B>(req: &Request<B>, jwt: &JwtValidator) -> Result<Claims, OdontoError> {
    let token = bearer_token(get_auth_header(req))
        .ok_or_else(|| OdontoError::Unauthorized("No token provided".into()))?;

    jwt.validate(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, TokenInput};

    #[test]
    fn test_error_response_status_and_code() {
        let response = error_response(&OdontoError::Conflict("already signed".into()));
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[test]
    fn test_authenticate() {
        let jwt = JwtValidator::new_dev();
        let issued = jwt
            .issue(TokenInput {
                user_id: "u1".into(),
                name: "Dr. X".into(),
                email: "x@y.com".into(),
                role: Role::Perito,
            })
            .unwrap();

        let req = Request::builder()
            .header(header::AUTHORIZATION, format!("Bearer {}", issued.token))
            .body(())
            .unwrap();
        let claims = authenticate(&req, &jwt).unwrap();
        assert_eq!(claims.role, Role::Perito);

        let anonymous = Request::builder().body(()).unwrap();
        assert!(matches!(
            authenticate(&anonymous, &jwt),
            Err(OdontoError::Unauthorized(_))
        ));

        let forged = Request::builder()
            .header(header::AUTHORIZATION, "Bearer not.a.token")
            .body(())
            .unwrap();
        assert!(authenticate(&forged, &jwt).is_err());
    }
}
