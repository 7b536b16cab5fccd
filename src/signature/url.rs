//! Public verification URL convention
//!
//! Exports of signed documents embed this URL (usually as a QR code). The
//! route that serves it is `GET /verify/{documentId}`.

/// Build `{base_url}/verify/{document_id}?hash={hash}&code={code}`.
pub fn verification_url(base_url: &str, document_id: &str, hash: &str, code: &str) -> String {
    format!(
        "{}/verify/{}?hash={}&code={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(document_id),
        urlencoding::encode(hash),
        urlencoding::encode(code)
    )
}
