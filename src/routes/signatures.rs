//! HTTP routes for signing and verification
//!
//! - POST /api/{reports|evidence-reports}/{id}/sign      - sign as the caller
//! - GET  /api/{reports|evidence-reports}/{id}/signature - cryptographic check
//! - GET  /verify/{documentId}?hash=..&code=..            - public check
//!
//! Verification always answers 200 with a result body; only signing maps
//! failures to error statuses.

use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::{canonical_id, DocumentKind};
use crate::routes::response::{
    authenticate, cors_preflight, error_response, json_response, method_not_allowed, not_found,
    BoxBody,
};
use crate::server::AppState;

/// Action addressed by an `/api/...` path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentAction {
    Sign,
    Signature,
}

/// Query string of the public verification link
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub code: String,
}

/// Split `/api/{collection}/{id}/{action}` into its parts
pub fn parse_api_path(path: &str) -> Option<(DocumentKind, String, DocumentAction)> {
    let rest = path.strip_prefix("/api/")?;
    let mut parts = rest.trim_end_matches('/').split('/');

    let kind = DocumentKind::from_path_segment(parts.next()?)?;
    let id = decode_segment(parts.next()?)?;
    let action = match parts.next()? {
        "sign" => DocumentAction::Sign,
        "signature" => DocumentAction::Signature,
        _ => return None,
    };

    if parts.next().is_some() {
        return None;
    }

    Some((kind, id, action))
}

/// Extract the document id from `/verify/{documentId}`
pub fn parse_verify_path(path: &str) -> Option<String> {
    let id = path.strip_prefix("/verify/")?.trim_end_matches('/');
    if id.contains('/') {
        return None;
    }
    decode_segment(id)
}

fn decode_segment(segment: &str) -> Option<String> {
    if segment.is_empty() {
        return None;
    }
    urlencoding::decode(segment).ok().map(|s| canonical_id(&s))
}

/// Handle `/api/*` requests.
///
/// Returns None when the path is not a document signature route.
pub async fn handle_api_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let (kind, id, action) = parse_api_path(req.uri().path())?;

    if req.method() == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let expected = match action {
        DocumentAction::Sign => Method::POST,
        DocumentAction::Signature => Method::GET,
    };
    if req.method() != expected {
        return Some(method_not_allowed());
    }

    let claims = match authenticate(&req, &state.jwt) {
        Ok(c) => c,
        Err(e) => return Some(error_response(&e)),
    };

    let response = match action {
        DocumentAction::Sign => match state.signing.sign(kind, &id, &claims).await {
            Ok(outcome) => json_response(StatusCode::CREATED, &outcome),
            Err(e) => error_response(&e),
        },
        DocumentAction::Signature => match state.signing.verify(kind, &id, &claims).await {
            Ok(result) => json_response(StatusCode::OK, &result),
            Err(e) => error_response(&e),
        },
    };

    Some(response)
}

/// GET /verify/{documentId}?hash=..&code=..
///
/// Unauthenticated. Missing parameters are treated as empty and fail the
/// comparison.
pub async fn handle_public_verify(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let path = req.uri().path().to_string();

    if req.method() == Method::OPTIONS {
        return cors_preflight();
    }
    if req.method() != Method::GET {
        return method_not_allowed();
    }

    let Some(document_id) = parse_verify_path(&path) else {
        return not_found(&path);
    };

    let query: VerifyQuery = req
        .uri()
        .query()
        .and_then(|q| serde_urlencoded::from_str(q).ok())
        .unwrap_or_default();

    match state
        .signing
        .public_verify(&document_id, &query.hash, &query.code)
        .await
    {
        Ok(result) => json_response(StatusCode::OK, &result),
        Err(e) => error_response(&e),
    }
}
