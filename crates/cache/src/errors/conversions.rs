//! Error conversion utilities

use super::types::{CacheError, RecoveryHint};

/// Store failures abort the invocation that hit them
impl From<CacheError> for conformer_core::Error {
    fn from(error: CacheError) -> Self {
        let message = match error.recovery_hint() {
            RecoveryHint::ClearAndRetry => format!("{error} (clear the cache and retry)"),
            RecoveryHint::CheckPermissions { path } => {
                format!("{error} (check permissions on '{}')", path.display())
            }
            RecoveryHint::Manual { instructions } => format!("{error} ({instructions})"),
        };
        conformer_core::Error::store_with_source(message, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_conversion_keeps_hint_and_source() {
        let err = CacheError::Corruption {
            key: "abc".to_string(),
            reason: "Data CRC mismatch".to_string(),
            recovery_hint: RecoveryHint::ClearAndRetry,
        };
        let core: conformer_core::Error = err.into();
        assert_eq!(
            core.to_string(),
            "cache store error: Cache corruption detected for key 'abc': Data CRC mismatch (clear the cache and retry)"
        );
        assert!(std::error::Error::source(&core).is_some());
    }

    #[test]
    fn test_locked_store_message() {
        let err = CacheError::StoreLocked {
            path: PathBuf::from("/tmp/cache.store"),
            recovery_hint: RecoveryHint::Manual {
                instructions: "wait for the other run".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "Cache store '/tmp/cache.store' is locked by another process"
        );
    }
}
