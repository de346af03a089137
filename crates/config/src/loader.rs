//! Configuration loader for conformer
//!
//! Layers are applied in order: built-in defaults, then an optional JSON
//! file, then `CONFORMER_*` environment variables. Callers apply their own
//! explicit overrides (e.g. CLI flags) on the returned config.

use crate::config::RunnerConfig;
use conformer_core::{
    Error, Result, CONFORMER_CACHE_DIR_VAR, CONFORMER_COMPRESSION_VAR, CONFORMER_TEST_ROOT_VAR,
    CONFORMER_TIMEOUT_VAR,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loader that handles all startup configuration
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Optional JSON file to read
    file: Option<PathBuf>,
    /// Whether `CONFORMER_*` variables are consulted
    skip_env: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from a JSON file
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Ignore environment variables
    pub fn without_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Load the configuration
    pub fn load(self) -> Result<RunnerConfig> {
        let mut config = match &self.file {
            Some(path) => read_file(path)?,
            None => RunnerConfig::default(),
        };

        if !self.skip_env {
            apply_env(&mut config)?;
        }

        tracing::debug!(
            test_root = %config.test_root.display(),
            cache_dir = %config.cache_dir.display(),
            timeout_ms = config.timeout.as_millis() as u64,
            compression = config.compression,
            "configuration loaded"
        );

        Ok(config)
    }
}

impl RunnerConfig {
    /// Defaults overridden by `CONFORMER_*` environment variables
    pub fn from_env() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Settings from a JSON file, then environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().file(path.as_ref()).load()
    }
}

fn read_file(path: &Path) -> Result<RunnerConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::file_system(path, "read configuration file", e))?;
    serde_json::from_str(&contents).map_err(|e| Error::Json {
        message: format!("invalid configuration in '{}'", path.display()),
        source: e,
    })
}

fn apply_env(config: &mut RunnerConfig) -> Result<()> {
    if let Some(root) = env_var(CONFORMER_TEST_ROOT_VAR) {
        config.test_root = PathBuf::from(root);
    }

    if let Some(dir) = env_var(CONFORMER_CACHE_DIR_VAR) {
        config.cache_dir = PathBuf::from(dir);
    }

    if let Some(raw) = env_var(CONFORMER_TIMEOUT_VAR) {
        let millis = raw.trim().parse::<u64>().map_err(|_| {
            Error::configuration(format!(
                "{CONFORMER_TIMEOUT_VAR} must be a number of milliseconds, got '{raw}'"
            ))
        })?;
        config.timeout = Duration::from_millis(millis);
    }

    if let Some(raw) = env_var(CONFORMER_COMPRESSION_VAR) {
        config.compression = parse_bool(&raw).ok_or_else(|| {
            Error::configuration(format!(
                "{CONFORMER_COMPRESSION_VAR} must be true or false, got '{raw}'"
            ))
        })?;
    }

    Ok(())
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
