//! Typed cache store mapping test keys to persisted outcomes

use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp};
use crate::storage::{CompressionConfig, StorageBackend, StorageStats};
use conformer_core::{CacheKey, CacheRecord};
use std::path::Path;

/// Persistent [`CacheKey`] → [`CacheRecord`] mapping.
///
/// Records are JSON-encoded before they reach the storage layer. Writes are
/// durable once `put` returns.
#[derive(Debug)]
pub struct CacheStore {
    backend: StorageBackend,
}

impl CacheStore {
    /// Open the store kept in `dir`, creating it if needed
    pub fn open(dir: &Path, compression: CompressionConfig) -> Result<Self> {
        let backend = StorageBackend::open(dir, compression)?;
        Ok(Self { backend })
    }

    pub fn get(&self, key: &CacheKey) -> Result<Option<CacheRecord>> {
        let Some(bytes) = self.backend.get(key.as_str())? else {
            return Ok(None);
        };

        let record = serde_json::from_slice(&bytes).map_err(|e| CacheError::Serialization {
            key: key.to_string(),
            operation: SerializationOp::Decode,
            source: Box::new(e),
            recovery_hint: RecoveryHint::ClearAndRetry,
        })?;
        Ok(Some(record))
    }

    pub fn put(&self, key: &CacheKey, record: &CacheRecord) -> Result<()> {
        let bytes = serde_json::to_vec(record).map_err(|e| CacheError::Serialization {
            key: key.to_string(),
            operation: SerializationOp::Encode,
            source: Box::new(e),
            recovery_hint: RecoveryHint::Manual {
                instructions: "Check the outcome for unserializable values".to_string(),
            },
        })?;

        self.backend.put(key.as_str(), &bytes)?;
        tracing::debug!(
            key = %key.short(),
            result = %record.outcome.kind(),
            "cache record stored"
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.backend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    pub fn stats(&self) -> StorageStats {
        self.backend.stats()
    }

    pub fn clear(&self) -> Result<()> {
        self.backend.clear()
    }

    pub fn compact(&self) -> Result<()> {
        self.backend.compact()
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        self.backend.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conformer_core::{ContentHash, Outcome};
    use serde_json::json;
    use tempfile::TempDir;

    fn record(hash: &str, output: &str) -> CacheRecord {
        CacheRecord::new(
            ContentHash::new(hash),
            Outcome::Success {
                output: output.to_string(),
            },
        )
    }

    #[test]
    fn test_put_then_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = CacheStore::open(temp_dir.path(), CompressionConfig::default()).unwrap();
        let key = CacheKey::new("k1");

        assert_eq!(store.get(&key).unwrap(), None);
        store.put(&key, &record("h1", "ok")).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(record("h1", "ok")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_records_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let key = CacheKey::new("k1");
        let failure = CacheRecord::new(
            ContentHash::new("h2"),
            Outcome::RuntimeFailure {
                error: json!({"name": "TypeError", "message": "x is not a function"}),
            },
        );
        {
            let store = CacheStore::open(temp_dir.path(), CompressionConfig::default()).unwrap();
            store.put(&key, &record("h1", "ok")).unwrap();
            store.put(&key, &failure).unwrap();
        }

        let store = CacheStore::open(temp_dir.path(), CompressionConfig::default()).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(failure));
    }

    #[test]
    fn test_undecodable_record_is_a_store_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = CacheStore::open(temp_dir.path(), CompressionConfig::default()).unwrap();
        store.backend.put("bad", b"not json").unwrap();

        let err = store.get(&CacheKey::new("bad")).unwrap_err();
        assert!(matches!(
            err,
            CacheError::Serialization {
                operation: SerializationOp::Decode,
                ..
            }
        ));
        assert_eq!(err.recovery_hint(), &RecoveryHint::ClearAndRetry);
    }

    #[test]
    fn test_clear_empties_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = CacheStore::open(temp_dir.path(), CompressionConfig::default()).unwrap();
        store.put(&CacheKey::new("a"), &record("h", "1")).unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.stats().file_bytes, 0);
    }
}
