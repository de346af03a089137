//! On-disk frame format
//!
//! A frame is a fixed-size bincode header followed by the key bytes and the
//! (possibly compressed) payload.

use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp};
use crc32c::{crc32c, crc32c_append};
use serde::{Deserialize, Serialize};

/// Magic number for frames: "CNFR"
pub const STORE_MAGIC: u32 = 0x434E_4652;

/// Current storage format version
pub const STORAGE_VERSION: u16 = 1;

/// Default zstd compression level (3 = fast with good compression)
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Encoded size of [`FrameHeader`] with bincode's fixed-width integers
pub const FRAME_HEADER_LEN: usize = 28;

/// Upper bound for a single key or payload. Writes past it are refused and
/// reads past it are corruption.
pub const MAX_SECTION_LEN: u32 = 64 * 1024 * 1024;

/// Binary header written in front of every record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(C)]
pub struct FrameHeader {
    /// Magic number for validation
    magic: u32,
    /// Storage format version
    version: u16,
    /// Flags (bit 0: compressed)
    flags: u16,
    /// Length of the key in bytes
    key_len: u32,
    /// Length of the payload as stored
    payload_len: u32,
    /// Payload length before compression
    raw_len: u32,
    /// CRC32C of key bytes followed by payload bytes
    data_crc: u32,
    /// CRC32C of the header with this field zeroed
    header_crc: u32,
}

impl FrameHeader {
    const FLAG_COMPRESSED: u16 = 1 << 0;

    pub fn new(key: &str, payload: &[u8], raw_len: usize, compressed: bool) -> Result<Self> {
        let mut header = Self {
            magic: STORE_MAGIC,
            version: STORAGE_VERSION,
            flags: if compressed { Self::FLAG_COMPRESSED } else { 0 },
            key_len: section_len(key, "key", key.len())?,
            payload_len: section_len(key, "stored value", payload.len())?,
            raw_len: section_len(key, "value", raw_len)?,
            data_crc: data_crc(key.as_bytes(), payload),
            header_crc: 0,
        };
        header.header_crc = header.calculate_crc();
        Ok(header)
    }

    fn calculate_crc(&self) -> u32 {
        let mut temp = *self;
        temp.header_crc = 0;

        match bincode::serialize(&temp) {
            Ok(bytes) => crc32c(&bytes),
            Err(_) => 0,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CacheError::Serialization {
            key: String::new(),
            operation: SerializationOp::Encode,
            source: Box::new(e),
            recovery_hint: RecoveryHint::Manual {
                instructions: "Check frame header serialization".to_string(),
            },
        })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header: Self =
            bincode::deserialize(bytes).map_err(|e| CacheError::Serialization {
                key: String::new(),
                operation: SerializationOp::Decode,
                source: Box::new(e),
                recovery_hint: RecoveryHint::ClearAndRetry,
            })?;
        header.validate()?;
        Ok(header)
    }

    pub fn validate(&self) -> Result<()> {
        if self.magic != STORE_MAGIC {
            return Err(corruption(format!(
                "Invalid magic number: expected {:08x}, got {:08x}",
                STORE_MAGIC, self.magic
            )));
        }

        if self.version > STORAGE_VERSION {
            return Err(CacheError::Corruption {
                key: String::new(),
                reason: format!("Unsupported storage version: {}", self.version),
                recovery_hint: RecoveryHint::Manual {
                    instructions: "Update conformer to read this cache format".to_string(),
                },
            });
        }

        let expected_crc = self.calculate_crc();
        if self.header_crc != expected_crc {
            return Err(corruption(format!(
                "Header CRC mismatch: expected {:08x}, got {:08x}",
                expected_crc, self.header_crc
            )));
        }

        if self.key_len > MAX_SECTION_LEN
            || self.payload_len > MAX_SECTION_LEN
            || self.raw_len > MAX_SECTION_LEN
        {
            return Err(corruption(format!(
                "Frame sections too large: key {} bytes, payload {} bytes, raw {} bytes",
                self.key_len, self.payload_len, self.raw_len
            )));
        }

        Ok(())
    }

    /// Check the data CRC against the bytes that followed this header
    pub fn verify_data(&self, key: &[u8], payload: &[u8]) -> Result<()> {
        let actual = data_crc(key, payload);
        if actual != self.data_crc {
            return Err(corruption(format!(
                "Data CRC mismatch: expected {:08x}, got {:08x}",
                self.data_crc, actual
            )));
        }
        Ok(())
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & Self::FLAG_COMPRESSED != 0
    }

    pub fn key_len(&self) -> usize {
        self.key_len as usize
    }

    pub fn payload_len(&self) -> usize {
        self.payload_len as usize
    }

    pub fn raw_len(&self) -> usize {
        self.raw_len as usize
    }

    /// Total size of the frame this header starts
    pub fn frame_len(&self) -> usize {
        FRAME_HEADER_LEN + self.key_len() + self.payload_len()
    }
}

/// Narrow a section length to the header's `u32`, refusing anything a reader
/// would reject
pub(crate) fn section_len(key: &str, section: &'static str, len: usize) -> Result<u32> {
    u32::try_from(len)
        .ok()
        .filter(|&len| len <= MAX_SECTION_LEN)
        .ok_or_else(|| CacheError::TooLarge {
            key: truncate_key(key),
            section,
            len,
            limit: MAX_SECTION_LEN,
            recovery_hint: RecoveryHint::Manual {
                instructions: "Cache records this large are not supported".to_string(),
            },
        })
}

fn truncate_key(key: &str) -> String {
    match key.char_indices().nth(64) {
        Some((end, _)) => format!("{}...", &key[..end]),
        None => key.to_string(),
    }
}

fn data_crc(key: &[u8], payload: &[u8]) -> u32 {
    crc32c_append(crc32c(key), payload)
}

fn corruption(reason: String) -> CacheError {
    CacheError::Corruption {
        key: String::new(),
        reason,
        recovery_hint: RecoveryHint::ClearAndRetry,
    }
}
