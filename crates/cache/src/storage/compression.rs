//! Compression configuration for the storage backend

use super::format::DEFAULT_COMPRESSION_LEVEL;
use serde::Serialize;

/// Compression configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompressionConfig {
    /// Whether compression is enabled
    pub enabled: bool,
    /// Compression level (1-22 for zstd, default 3)
    pub level: i32,
    /// Minimum payload size in bytes before compression is applied
    pub min_size: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: DEFAULT_COMPRESSION_LEVEL,
            min_size: 128,
        }
    }
}

impl CompressionConfig {
    /// Store every payload as-is
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub(crate) fn should_compress(&self, len: usize) -> bool {
        self.enabled && len >= self.min_size
    }
}
