//! Runner configuration
//!
//! The configuration is immutable after construction and is shared by every
//! test invocation of a runner.

use conformer_core::{DEFAULT_CACHE_DIR, DEFAULT_TEST_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// An external program plus its leading arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Settings a runner is set up with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunnerConfig {
    /// Base directory that relative test paths resolve against
    pub test_root: PathBuf,

    /// Directory holding the cache store file
    pub cache_dir: PathBuf,

    /// Deadline for a single evaluation
    #[serde(rename = "timeoutMs", with = "millis")]
    pub timeout: Duration,

    /// Whether cache records are compressed on disk
    pub compression: bool,

    /// Host command the process agent runs tests with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<CommandSpec>,

    /// External transpiler; sources pass through unchanged when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transpiler: Option<CommandSpec>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            test_root: PathBuf::from("."),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            timeout: DEFAULT_TEST_TIMEOUT,
            compression: true,
            agent: None,
            transpiler: None,
        }
    }
}

impl RunnerConfig {
    pub fn builder() -> RunnerConfigBuilder {
        RunnerConfigBuilder::default()
    }

    /// Absolute path of a test given its path relative to the test root
    pub fn resolve_test_path(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.test_root.join(file)
        }
    }
}

/// Builder for [`RunnerConfig`]
#[derive(Debug, Default)]
pub struct RunnerConfigBuilder {
    config: RunnerConfig,
}

impl RunnerConfigBuilder {
    pub fn test_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.test_root = root.into();
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = dir.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn compression(mut self, enabled: bool) -> Self {
        self.config.compression = enabled;
        self
    }

    pub fn agent(mut self, agent: CommandSpec) -> Self {
        self.config.agent = Some(agent);
        self
    }

    pub fn transpiler(mut self, transpiler: CommandSpec) -> Self {
        self.config.transpiler = Some(transpiler);
        self
    }

    pub fn build(self) -> RunnerConfig {
        self.config
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
