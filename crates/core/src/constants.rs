/// Constants used throughout the conformer codebase
use std::time::Duration;

/// Deadline for a single test evaluation
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_millis(60_000);

// Cache store layout
pub const CACHE_FILE_NAME: &str = "cache.store";
pub const DEFAULT_CACHE_DIR: &str = ".";

/// Substrings that mark a test source as having effects outside the sandboxed
/// evaluation. A hit in the comment-stripped source disables caching.
pub const SIDE_EFFECT_TOKENS: &[&str] = &["eval(", "require(", "import", "evalScript("];

// Environment variable names
pub const CONFORMER_LOG_VAR: &str = "CONFORMER_LOG";
pub const CONFORMER_TEST_ROOT_VAR: &str = "CONFORMER_TEST_ROOT";
pub const CONFORMER_CACHE_DIR_VAR: &str = "CONFORMER_CACHE_DIR";
pub const CONFORMER_TIMEOUT_VAR: &str = "CONFORMER_TIMEOUT_MS";
pub const CONFORMER_COMPRESSION_VAR: &str = "CONFORMER_COMPRESSION";
