//! Stable row keys for stored entries.

use sha2::{Digest, Sha256};

use crate::http::RequestKey;

/// Compute the row key for a request identity.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

impl RequestKey {
    pub fn hash(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("GET", "https://game.example/");
        let hash2 = compute_cache_key("GET", "https://game.example/");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_method_case_insensitive() {
        assert_eq!(compute_cache_key("get", "https://game.example/"), compute_cache_key("GET", "https://game.example/"));
    }

    #[test]
    fn test_hash_different_method() {
        let get = compute_cache_key("GET", "https://game.example/api/scores");
        let head = compute_cache_key("HEAD", "https://game.example/api/scores");
        assert_ne!(get, head);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("GET", "https://game.example/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
