//! Content hashing for signable documents

use sha2::{Digest, Sha256};

/// Compute the content hash of a document.
///
/// The digest input is `id ++ content ++ conclusion` with no separators. A
/// missing conclusion contributes nothing. Output is lowercase hex (64 chars).
pub fn content_hash(id: &str, content: &str, conclusion: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    hasher.update(content.as_bytes());
    hasher.update(conclusion.unwrap_or("").as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let a = content_hash("abc123", "Findings: fracture observed.", Some("Consistent with trauma."));
        let b = content_hash("abc123", "Findings: fracture observed.", Some("Consistent with trauma."));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_hash_matches_plain_concatenation() {
        let expected = hex::encode(Sha256::digest(b"abc123Findings: fracture observed.Consistent with trauma."));
        assert_eq!(
            content_hash("abc123", "Findings: fracture observed.", Some("Consistent with trauma.")),
            expected
        );
    }

    #[test]
    fn test_missing_conclusion_equals_empty() {
        assert_eq!(
            content_hash("id", "body", None),
            content_hash("id", "body", Some(""))
        );
    }

    #[test]
    fn test_conclusion_changes_hash() {
        assert_ne!(
            content_hash("abc123", "Findings", Some("Consistent with trauma.")),
            content_hash("abc123", "Findings", Some("Inconclusive."))
        );
    }

    #[test]
    fn test_known_sha256_vector() {
        // SHA-256("abc")
        assert_eq!(
            content_hash("a", "b", Some("c")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
