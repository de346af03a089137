//! Single-file storage backend
//!
//! Records live in one append-only log file:
//! - every `put` appends a frame and syncs it before the index is updated
//! - frames carry CRC32C checksums over header and data
//! - payloads are zstd-compressed once they reach a minimum size
//! - on open the log is replayed into memory; a torn or corrupt tail left by
//!   an abrupt exit is cut off at the last valid frame
//! - superseded frames are dropped by compaction (temp file + atomic rename)

mod backend;
mod compression;
mod format;
mod log;

pub use backend::{StorageBackend, StorageStats, COMPACT_MIN_DEAD_FRAMES};
pub use compression::CompressionConfig;
pub use format::{
    FrameHeader, DEFAULT_COMPRESSION_LEVEL, FRAME_HEADER_LEN, MAX_SECTION_LEN, STORAGE_VERSION,
    STORE_MAGIC,
};
