//! Content fingerprinting for cache keys and compiled sources

use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp};
use conformer_core::{CacheKey, ContentHash, TestAttributes};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// What a cache key is derived from: the test's identity, not its content
#[derive(Serialize)]
struct KeyMaterial<'a> {
    attrs: &'a TestAttributes,
    file: &'a str,
}

/// SHA-256 of `data` as lowercase hex
pub fn digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Derive the cache key for a test from its attributes and relative path.
///
/// The canonical form is the JSON serialization of `{attrs, file}`; struct
/// fields serialize in declaration order and features keep their given order.
pub fn cache_key(attrs: &TestAttributes, file: &str) -> Result<CacheKey> {
    let material = KeyMaterial { attrs, file };
    let serialized = serde_json::to_vec(&material).map_err(|e| CacheError::Serialization {
        key: file.to_string(),
        operation: SerializationOp::Encode,
        source: Box::new(e),
        recovery_hint: RecoveryHint::Manual {
            instructions: "Check the test attributes for unserializable values".to_string(),
        },
    })?;
    Ok(CacheKey::new(digest(&serialized)))
}

/// Fingerprint of a transpiled source
pub fn content_hash(transpiled: &str) -> ContentHash {
    ContentHash::new(digest(transpiled.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use conformer_core::TestFlags;
    use proptest::prelude::*;

    #[test]
    fn test_digest_known_vector() {
        assert_eq!(
            digest(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_cache_key_depends_on_identity() {
        let attrs = TestAttributes::default();
        let key = cache_key(&attrs, "a.js").unwrap();

        assert_eq!(key, cache_key(&attrs, "a.js").unwrap());
        assert_ne!(key, cache_key(&attrs, "b.js").unwrap());

        let module = TestAttributes {
            flags: TestFlags {
                module: true,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_ne!(key, cache_key(&module, "a.js").unwrap());

        let featured = TestAttributes {
            features: vec!["BigInt".to_string()],
            ..Default::default()
        };
        assert_ne!(key, cache_key(&featured, "a.js").unwrap());
    }

    #[test]
    fn test_cache_key_ignores_contents() {
        // contents are not part of the key material; drift is caught by the content hash
        let attrs = TestAttributes::default();
        assert_eq!(cache_key(&attrs, "a.js").unwrap().len(), 64);
        assert_ne!(content_hash("var x = 1;"), content_hash("var x = 2;"));
    }

    proptest! {
        #[test]
        fn prop_content_hash_is_deterministic(src in ".*") {
            let first = content_hash(&src);
            prop_assert_eq!(first.len(), 64);
            prop_assert_eq!(first, content_hash(&src));
        }

        #[test]
        fn prop_distinct_paths_give_distinct_keys(a in "[a-z/]{1,20}\\.js", b in "[a-z/]{1,20}\\.js") {
            prop_assume!(a != b);
            let attrs = TestAttributes::default();
            prop_assert_ne!(cache_key(&attrs, &a).unwrap(), cache_key(&attrs, &b).unwrap());
        }
    }
}
