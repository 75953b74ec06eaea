use sha2::{Digest, Sha256};

/// Short, stable identifier for a bearer token, safe to put in logs.
/// The token itself never leaves the request that carried it.
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let out = hasher.finalize();
    hex::encode(&out[..6])
}

/// Normalize an `Authorization: Bearer` value; empty tokens are rejected.
pub fn clean_bearer(raw: &str) -> Option<&str> {
    let t = raw.trim();
    if t.is_empty() { None } else { Some(t) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_short_and_stable() {
        let a = token_fingerprint("secret-token");
        let b = token_fingerprint("secret-token");
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
        assert!(!a.contains("secret"));
        assert_ne!(a, token_fingerprint("other-token"));
    }

    #[test]
    fn test_clean_bearer() {
        assert_eq!(clean_bearer("  abc "), Some("abc"));
        assert_eq!(clean_bearer("   "), None);
    }
}
