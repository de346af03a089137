use std::path::PathBuf;

/// Result type alias for conformer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for conformer operations
///
/// Test outcomes (parse, runtime and timeout failures) are not errors; they are
/// classified into [`crate::Outcome`]. This type covers the failures that abort
/// an invocation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Cache store read/write failures
    #[error("cache store error: {message}")]
    Store {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// The transpiler could not be run at all
    #[error("transpiler error: {message}")]
    Transpiler { message: String },

    /// The execution agent could not run the test at all
    #[error("execution agent error: {message}")]
    Agent { message: String },
}

// Helper methods for creating errors with context
impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a cache store error wrapping its cause
    #[must_use]
    pub fn store_with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Store {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a transpiler infrastructure error
    #[must_use]
    pub fn transpiler(message: impl Into<String>) -> Self {
        Error::Transpiler {
            message: message.into(),
        }
    }

    /// Create an execution agent error
    #[must_use]
    pub fn agent(message: impl Into<String>) -> Self {
        Error::Agent {
            message: message.into(),
        }
    }
}
