//! Storage backend implementation

use super::compression::CompressionConfig;
use super::log::{self, StoredValue};
use crate::errors::{CacheError, RecoveryHint, Result};
use conformer_core::CACHE_FILE_NAME;
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Superseded frames tolerated before `open` compacts the log
pub const COMPACT_MIN_DEAD_FRAMES: u64 = 1024;

/// Point-in-time numbers about the store
#[derive(Debug, Clone, Serialize)]
pub struct StorageStats {
    pub path: PathBuf,
    pub live_entries: usize,
    pub frames_on_disk: u64,
    pub file_bytes: u64,
    pub compression: CompressionConfig,
}

struct LogFile {
    file: File,
    len: u64,
    frames: u64,
}

/// Persistent byte-level key → value storage in a single log file.
///
/// The file is held under an exclusive advisory lock for the lifetime of the
/// backend, so only one process appends to it at a time.
pub struct StorageBackend {
    path: PathBuf,
    compression: CompressionConfig,
    log: Mutex<LogFile>,
    index: RwLock<HashMap<String, StoredValue>>,
}

impl std::fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBackend")
            .field("path", &self.path)
            .field("compression", &self.compression)
            .finish_non_exhaustive()
    }
}

impl StorageBackend {
    /// Open (or create) the store file inside `dir` and replay it
    pub fn open(dir: &Path, compression: CompressionConfig) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| CacheError::Io {
            path: dir.to_path_buf(),
            operation: "create cache directory",
            source: e,
            recovery_hint: RecoveryHint::CheckPermissions {
                path: dir.to_path_buf(),
            },
        })?;

        let path = dir.join(CACHE_FILE_NAME);
        let mut file = open_log(&path)?;
        lock_log(&file, &path)?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| CacheError::Io {
            path: path.clone(),
            operation: "read cache log",
            source: e,
            recovery_hint: RecoveryHint::CheckPermissions { path: path.clone() },
        })?;

        let replay = log::replay(&bytes, &path);
        if replay.torn {
            file.set_len(replay.valid_len)
                .and_then(|()| file.sync_all())
                .map_err(|e| CacheError::Io {
                    path: path.clone(),
                    operation: "truncate torn cache log",
                    source: e,
                    recovery_hint: RecoveryHint::ClearAndRetry,
                })?;
        }

        let frames = replay.entries.len() as u64;
        let index: HashMap<String, StoredValue> = replay.entries.into_iter().collect();

        tracing::debug!(
            path = %path.display(),
            frames,
            live_entries = index.len(),
            bytes = replay.valid_len,
            "cache store opened"
        );

        let backend = Self {
            path,
            compression,
            log: Mutex::new(LogFile {
                file,
                len: replay.valid_len,
                frames,
            }),
            index: RwLock::new(index),
        };

        if backend.needs_compaction() {
            backend.compact()?;
        }

        Ok(backend)
    }

    /// Location of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the value stored under `key`
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let index = self.index.read();
        match index.get(key) {
            Some(value) => log::decode_value(key, value).map(Some),
            None => Ok(None),
        }
    }

    /// Store `data` under `key`, replacing any previous value.
    ///
    /// The frame is synced to disk before the value becomes visible to `get`.
    pub fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let (frame, value) = log::encode_frame(key, data, &self.compression)?;

        let mut guard = self.log.lock();
        let log = &mut *guard;

        if let Err(e) = log.file.write_all(&frame).and_then(|()| log.file.sync_data()) {
            // drop a partially written frame so later appends stay readable
            let _ = log.file.set_len(log.len);
            return Err(CacheError::Io {
                path: self.path.clone(),
                operation: "append cache frame",
                source: e,
                recovery_hint: RecoveryHint::CheckPermissions {
                    path: self.path.clone(),
                },
            });
        }

        log.len += frame.len() as u64;
        log.frames += 1;
        self.index.write().insert(key.to_string(), value);
        Ok(())
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    pub fn stats(&self) -> StorageStats {
        let log = self.log.lock();
        StorageStats {
            path: self.path.clone(),
            live_entries: self.len(),
            frames_on_disk: log.frames,
            file_bytes: log.len,
            compression: self.compression,
        }
    }

    /// Drop every record
    pub fn clear(&self) -> Result<()> {
        let mut log = self.log.lock();
        log.file
            .set_len(0)
            .and_then(|()| log.file.sync_all())
            .map_err(|e| CacheError::Io {
                path: self.path.clone(),
                operation: "clear cache log",
                source: e,
                recovery_hint: RecoveryHint::CheckPermissions {
                    path: self.path.clone(),
                },
            })?;
        log.len = 0;
        log.frames = 0;
        self.index.write().clear();

        tracing::info!(path = %self.path.display(), "cache store cleared");
        Ok(())
    }

    /// Rewrite the log so it holds exactly one frame per live key
    pub fn compact(&self) -> Result<()> {
        let mut guard = self.log.lock();
        let log = &mut *guard;
        let index = self.index.read();

        let mut bytes = Vec::new();
        for (key, value) in index.iter() {
            let raw = log::decode_value(key, value)?;
            let (frame, _) = log::encode_frame(key, &raw, &self.compression)?;
            bytes.extend_from_slice(&frame);
        }

        // only the lock holder compacts, so a fixed sibling name is safe
        let temp_path = self.path.with_extension("store.compact");
        let io_err = |operation: &'static str, path: &Path| {
            let path = path.to_path_buf();
            move |e: std::io::Error| CacheError::Io {
                path: path.clone(),
                operation,
                source: e,
                recovery_hint: RecoveryHint::CheckPermissions { path },
            }
        };

        let mut temp = open_log(&temp_path)?;
        temp.set_len(0)
            .map_err(io_err("reset compaction file", &temp_path))?;
        temp.write_all(&bytes)
            .and_then(|()| temp.sync_all())
            .map_err(io_err("write compacted cache log", &temp_path))?;
        lock_log(&temp, &temp_path)?;

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(io_err("replace cache log", &self.path)(e));
        }

        let before = log.frames;
        log.file = temp;
        log.len = bytes.len() as u64;
        log.frames = index.len() as u64;

        tracing::info!(
            path = %self.path.display(),
            frames_before = before,
            frames_after = log.frames,
            "cache log compacted"
        );
        Ok(())
    }

    fn needs_compaction(&self) -> bool {
        let frames = self.log.lock().frames;
        let live = self.len() as u64;
        let dead = frames.saturating_sub(live);
        dead >= COMPACT_MIN_DEAD_FRAMES && dead > live
    }
}

fn open_log(path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            operation: "open cache log",
            source: e,
            recovery_hint: RecoveryHint::CheckPermissions {
                path: path.to_path_buf(),
            },
        })
}

fn lock_log(file: &File, path: &Path) -> Result<()> {
    match file.try_lock_exclusive() {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            Err(CacheError::StoreLocked {
                path: path.to_path_buf(),
                recovery_hint: RecoveryHint::Manual {
                    instructions: "Wait for the other conformer process or use a different cache directory"
                        .to_string(),
                },
            })
        }
        Err(e) => Err(CacheError::Io {
            path: path.to_path_buf(),
            operation: "lock cache log",
            source: e,
            recovery_hint: RecoveryHint::CheckPermissions {
                path: path.to_path_buf(),
            },
        }),
    }
}
