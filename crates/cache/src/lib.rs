//! Cache system for conformer
//!
//! This crate provides the persistent cache behind the test runner:
//! - SHA-256 fingerprints for cache keys and transpiled content
//! - A single-file, append-only record log with zstd compression and
//!   CRC32C checksums, replayed into memory on open
//! - [`CacheStore`], the typed key → [`conformer_core::CacheRecord`] mapping
//!
//! The store is dumb storage. Whether a test may be cached at all is decided
//! by the runner.

pub mod errors;
pub mod hashing;
pub mod storage;
pub mod store;

pub use errors::{CacheError, RecoveryHint, Result, SerializationOp};
pub use hashing::{cache_key, content_hash, digest};
pub use storage::{CompressionConfig, StorageBackend, StorageStats};
pub use store::CacheStore;
