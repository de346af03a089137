//! Source transpilation ahead of evaluation

use conformer_config::CommandSpec;
use std::io::Write;
use std::process::{Command, Stdio};
use thiserror::Error;

/// How a test source should be compiled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranspileOptions {
    pub features: Vec<String>,
    pub is_module: bool,
    pub is_strict: bool,
}

/// Why a source did not transpile.
///
/// A rejection is a test outcome; the runner turns it into a parse failure.
/// An unavailable transpiler is an infrastructure failure and aborts the
/// invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranspileError {
    #[error("{message}")]
    Rejected {
        message: String,
        line: Option<u32>,
        column: Option<u32>,
    },

    #[error("{message}")]
    Unavailable { message: String },
}

impl TranspileError {
    pub fn rejected(message: impl Into<String>) -> Self {
        TranspileError::Rejected {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        TranspileError::Unavailable {
            message: message.into(),
        }
    }

    /// Attach a source location to a rejection
    #[must_use]
    pub fn at(self, line: u32, column: u32) -> Self {
        match self {
            TranspileError::Rejected { message, .. } => TranspileError::Rejected {
                message,
                line: Some(line),
                column: Some(column),
            },
            other => other,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            TranspileError::Rejected { message, .. } | TranspileError::Unavailable { message } => {
                message
            }
        }
    }
}

/// Pure `source -> transpiled source` transformation
pub trait Transpiler: Send + Sync {
    fn transpile(
        &self,
        contents: &str,
        options: &TranspileOptions,
    ) -> Result<String, TranspileError>;
}

/// Hands sources to the agent unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranspiler;

impl Transpiler for PassthroughTranspiler {
    fn transpile(&self, contents: &str, _options: &TranspileOptions) -> Result<String, TranspileError> {
        Ok(contents.to_string())
    }
}

/// Pipes the source through an external program.
///
/// The program reads the source on stdin and writes the transpiled form to
/// stdout. Options are passed as arguments after the configured ones:
/// `--module`, `--strict` and one `--feature <name>` per feature. A non-zero
/// exit is a rejection carrying the program's stderr; failing to run the
/// program at all makes it unavailable.
#[derive(Debug, Clone)]
pub struct CommandTranspiler {
    command: CommandSpec,
}

impl CommandTranspiler {
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }

    fn build_command(&self, options: &TranspileOptions) -> Command {
        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.args);
        if options.is_module {
            cmd.arg("--module");
        }
        if options.is_strict {
            cmd.arg("--strict");
        }
        for feature in &options.features {
            cmd.arg("--feature").arg(feature);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Transpiler for CommandTranspiler {
    fn transpile(&self, contents: &str, options: &TranspileOptions) -> Result<String, TranspileError> {
        let program = &self.command.program;
        let mut child = self.build_command(options).spawn().map_err(|e| {
            TranspileError::unavailable(format!("failed to spawn transpiler '{program}': {e}"))
        })?;

        // feed stdin from its own thread so a child streaming to stdout never
        // blocks on a full pipe while we are still writing
        let writer = child.stdin.take().map(|mut stdin| {
            let source = contents.to_string();
            std::thread::spawn(move || stdin.write_all(source.as_bytes()))
        });

        let output = child.wait_with_output().map_err(|e| {
            TranspileError::unavailable(format!("failed to wait for transpiler '{program}': {e}"))
        })?;

        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => {}
                // the child may exit without draining stdin; its status decides
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Ok(Err(e)) => {
                    return Err(TranspileError::unavailable(format!(
                        "failed to write to transpiler '{program}': {e}"
                    )))
                }
                Err(_) => {
                    return Err(TranspileError::unavailable(format!(
                        "stdin writer for transpiler '{program}' panicked"
                    )))
                }
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!(
                program = %program,
                status = ?output.status.code(),
                "transpiler rejected source"
            );
            if stderr.is_empty() {
                return Err(TranspileError::rejected(format!(
                    "transpiler '{program}' exited with {}",
                    output.status
                )));
            }
            return Err(parse_location(stderr));
        }

        String::from_utf8(output.stdout).map_err(|e| {
            TranspileError::unavailable(format!("transpiler '{program}' produced invalid UTF-8: {e}"))
        })
    }
}

/// Pick a trailing `(line:column)` off a diagnostic such as
/// `Unexpected token (1:4)`.
fn parse_location(message: String) -> TranspileError {
    let location = message
        .strip_suffix(')')
        .and_then(|rest| rest.rsplit_once('('))
        .and_then(|(_, loc)| loc.split_once(':'))
        .and_then(|(line, column)| Some((line.parse().ok()?, column.parse().ok()?)));

    match location {
        Some((line, column)) => TranspileError::rejected(message).at(line, column),
        None => TranspileError::rejected(message),
    }
}
