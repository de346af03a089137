//! Frame encoding and log replay

use super::compression::CompressionConfig;
use super::format::{section_len, FrameHeader, FRAME_HEADER_LEN};
use crate::errors::{CacheError, RecoveryHint, Result};
use std::path::Path;
use zstd::stream::{decode_all as zstd_decode, encode_all as zstd_encode};

/// A payload as it sits in the log (and in the in-memory index)
#[derive(Debug, Clone)]
pub(crate) struct StoredValue {
    pub bytes: Vec<u8>,
    pub compressed: bool,
    pub raw_len: usize,
}

/// Outcome of replaying a log file
#[derive(Debug, Default)]
pub(crate) struct Replay {
    /// Valid frames in file order; later frames supersede earlier ones
    pub entries: Vec<(String, StoredValue)>,
    /// Byte length of the valid prefix
    pub valid_len: u64,
    /// Whether bytes after `valid_len` had to be discarded
    pub torn: bool,
}

/// Build the bytes of one frame for `key` → `data`
pub(crate) fn encode_frame(
    key: &str,
    data: &[u8],
    compression: &CompressionConfig,
) -> Result<(Vec<u8>, StoredValue)> {
    section_len(key, "key", key.len())?;
    section_len(key, "value", data.len())?;
    let compressed = compression.should_compress(data.len());

    let payload = if compressed {
        zstd_encode(data, compression.level).map_err(|e| CacheError::Compression {
            operation: "compress",
            source: Box::new(e),
            recovery_hint: RecoveryHint::Manual {
                instructions: "Check compression settings".to_string(),
            },
        })?
    } else {
        data.to_vec()
    };

    tracing::trace!(
        key = %key,
        raw_len = data.len(),
        stored_len = payload.len(),
        compressed,
        "encoded cache frame"
    );

    let header = FrameHeader::new(key, &payload, data.len(), compressed)?;
    let header_bytes = header.encode()?;

    let mut frame = Vec::with_capacity(header_bytes.len() + key.len() + payload.len());
    frame.extend_from_slice(&header_bytes);
    frame.extend_from_slice(key.as_bytes());
    frame.extend_from_slice(&payload);

    Ok((
        frame,
        StoredValue {
            bytes: payload,
            compressed,
            raw_len: data.len(),
        },
    ))
}

/// Restore the original bytes of a stored value
pub(crate) fn decode_value(key: &str, value: &StoredValue) -> Result<Vec<u8>> {
    if !value.compressed {
        return Ok(value.bytes.clone());
    }

    let data = zstd_decode(value.bytes.as_slice()).map_err(|e| CacheError::Compression {
        operation: "decompress",
        source: Box::new(e),
        recovery_hint: RecoveryHint::ClearAndRetry,
    })?;

    if data.len() != value.raw_len {
        return Err(CacheError::Corruption {
            key: key.to_string(),
            reason: format!(
                "Decompressed size mismatch: expected {}, got {}",
                value.raw_len,
                data.len()
            ),
            recovery_hint: RecoveryHint::ClearAndRetry,
        });
    }

    Ok(data)
}

/// Walk the frames in `bytes`, stopping at the first one that is truncated
/// or fails validation.
pub(crate) fn replay(bytes: &[u8], path: &Path) -> Replay {
    let mut replay = Replay::default();
    let mut offset = 0usize;

    while offset < bytes.len() {
        match read_frame(&bytes[offset..]) {
            Ok((key, value, len)) => {
                replay.entries.push((key, value));
                offset += len;
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    offset,
                    discarded = bytes.len() - offset,
                    corrupt = e.is_corruption(),
                    "cache log corruption detected, truncating at last valid frame: {}",
                    e
                );
                replay.torn = true;
                break;
            }
        }
    }

    replay.valid_len = offset as u64;
    replay
}

fn read_frame(bytes: &[u8]) -> Result<(String, StoredValue, usize)> {
    if bytes.len() < FRAME_HEADER_LEN {
        return Err(truncated(bytes.len(), FRAME_HEADER_LEN));
    }

    let header = FrameHeader::decode(&bytes[..FRAME_HEADER_LEN])?;
    let frame_len = header.frame_len();
    if bytes.len() < frame_len {
        return Err(truncated(bytes.len(), frame_len));
    }

    let key_end = FRAME_HEADER_LEN + header.key_len();
    let key_bytes = &bytes[FRAME_HEADER_LEN..key_end];
    let payload = &bytes[key_end..frame_len];
    header.verify_data(key_bytes, payload)?;

    let key = String::from_utf8(key_bytes.to_vec()).map_err(|e| CacheError::Corruption {
        key: String::new(),
        reason: format!("Key is not valid UTF-8: {e}"),
        recovery_hint: RecoveryHint::ClearAndRetry,
    })?;

    Ok((
        key,
        StoredValue {
            bytes: payload.to_vec(),
            compressed: header.is_compressed(),
            raw_len: header.raw_len(),
        },
        frame_len,
    ))
}

fn truncated(available: usize, needed: usize) -> CacheError {
    CacheError::Corruption {
        key: String::new(),
        reason: format!("Frame truncated: {available} bytes left, {needed} needed"),
        recovery_hint: RecoveryHint::ClearAndRetry,
    }
}
